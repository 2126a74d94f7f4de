//! CD Player
//!
//! This example drives a CD player statechart.
//!
//! Key concepts:
//! - A composite `playing` state with its own song region
//! - An orthogonal error region running next to the player
//! - Guards reading the machine context
//! - Internal reactions that leave the state untouched
//! - Transition history
//!
//! Run with: cargo run --example player

use hfsm::runtime::Scope;
use hfsm::{event_enum, ActionError, Machine, Row, StateDescriptor, StateGraph, Target, TransitionTable};

event_enum! {
    enum Player: PlayerKind {
        Play,
        Pause,
        EndPause,
        Stop,
        OpenClose,
        CdDetected(String),
        NextSong,
        PrevSong,
        ErrorFound,
        Volume(u8),
    }
}

#[derive(Debug, Default)]
struct Deck {
    disc: Option<String>,
    volume: u8,
}

type State = StateDescriptor<Player, Deck>;
type Table = TransitionTable<Player, Deck>;
type R = Row<Player, Deck>;

fn say(
    line: &'static str,
) -> impl Fn(&mut Scope<'_, Player, Deck>) -> Result<(), ActionError> + Send + Sync + 'static {
    move |_| {
        println!("  {line}");
        Ok(())
    }
}

fn build() -> StateGraph<Player, Deck> {
    let mut graph = StateGraph::new();

    let empty = graph.add_state(State::new("empty").on_entry(say("waiting for a disc")));
    let open = graph.add_state(State::new("open").on_entry(say("drawer open")));
    let stopped = graph.add_state(State::new("stopped").on_entry(say("stopped")));
    let paused = graph.add_state(State::new("paused").on_entry(say("paused")));

    let song1 = graph.add_state(State::new("song 1").on_entry(say("playing song 1")));
    let song2 = graph.add_state(State::new("song 2").on_entry(say("playing song 2")));
    let song3 = graph.add_state(State::new("song 3").on_entry(say("playing song 3")));
    let playing = graph.add_state(
        State::new("playing")
            .on_exit(say("leaving playback"))
            .on_event(PlayerKind::Volume, |scope| {
                if let Some(Player::Volume(level)) = scope.event().cloned() {
                    scope.context_mut().volume = level;
                    println!("  volume set to {level}");
                }
                Ok(())
            })
            .region(
                Table::new("songs")
                    .row(R::initial(song1))
                    .row(R::new(song1, song2).on(PlayerKind::NextSong))
                    .row(R::new(song2, song3).on(PlayerKind::NextSong))
                    .row(R::new(song3, song2).on(PlayerKind::PrevSong))
                    .row(R::new(song2, song1).on(PlayerKind::PrevSong)),
            ),
    );

    graph.add_root_region(
        Table::new("player")
            .row(R::initial(empty))
            .row(R::new(empty, open).on(PlayerKind::OpenClose))
            .row(
                R::new(empty, stopped)
                    .on(PlayerKind::CdDetected)
                    .action(|scope| {
                        if let Some(Player::CdDetected(title)) = scope.event().cloned() {
                            println!("  loaded {title}");
                            scope.context_mut().disc = Some(title);
                        }
                        Ok(())
                    }),
            )
            .row(R::new(open, empty).on(PlayerKind::OpenClose))
            .row(
                R::new(stopped, playing)
                    .on(PlayerKind::Play)
                    .when(|scope| scope.context().disc.is_some()),
            )
            .row(R::new(stopped, open).on(PlayerKind::OpenClose))
            .row(R::new(playing, stopped).on(PlayerKind::Stop))
            .row(R::new(playing, paused).on(PlayerKind::Pause))
            .row(R::new(playing, open).on(PlayerKind::OpenClose))
            .row(R::new(paused, playing).on(PlayerKind::EndPause))
            .row(R::new(paused, stopped).on(PlayerKind::Stop)),
    );

    let all_ok = graph.add_state(State::new("all ok"));
    graph.add_root_region(
        Table::new("health")
            .row(R::initial(all_ok))
            .row(
                R::new(all_ok, Target::Stopped)
                    .on(PlayerKind::ErrorFound)
                    .action(say("error found, health region stopped")),
            ),
    );

    graph
}

fn send(machine: &mut Machine<Player, Deck>, event: Player) {
    println!("> {event:?}");
    if let Err(error) = machine.process_event(event) {
        println!("  error: {error}");
    }
    println!("  active: {}", machine.active_state_names().join(", "));
}

fn main() {
    println!("=== CD Player ===\n");

    let mut machine = match Machine::new(build(), Deck::default()) {
        Ok(machine) => machine,
        Err(error) => {
            eprintln!("invalid player graph: {error}");
            return;
        }
    };
    println!("  active: {}", machine.active_state_names().join(", "));

    send(&mut machine, Player::Play);
    send(&mut machine, Player::CdDetected("Louie, Louie".to_string()));
    send(&mut machine, Player::Play);
    send(&mut machine, Player::NextSong);
    send(&mut machine, Player::Volume(7));
    send(&mut machine, Player::NextSong);
    send(&mut machine, Player::PrevSong);
    send(&mut machine, Player::Pause);
    send(&mut machine, Player::EndPause);
    send(&mut machine, Player::Stop);
    send(&mut machine, Player::ErrorFound);

    machine.stop();
    println!("\nvolume: {}", machine.context().volume);
    println!("path: {}", machine.history().get_path().join(" -> "));
}
