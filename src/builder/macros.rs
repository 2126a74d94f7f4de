//! Macros for ergonomic event declaration.

/// Declare an event enum together with its kind tag and `Event` impl.
///
/// Unit and tuple variants are supported. The kind enum gets one unit
/// variant per event variant, with the same name.
///
/// # Example
///
/// ```
/// use hfsm::core::Event;
/// use hfsm::event_enum;
///
/// event_enum! {
///     pub enum Player: PlayerKind {
///         Play,
///         Stop,
///         Seek(u32),
///     }
/// }
///
/// assert_eq!(Player::Seek(12).kind(), PlayerKind::Seek);
/// assert_eq!(Player::Play.name(), "Play");
/// ```
#[macro_export]
macro_rules! event_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident : $kind:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $( ( $($field:ty),* $(,)? ) )?
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Debug)]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant $( ( $($field),* ) )?
            ),*
        }

        #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
        $vis enum $kind {
            $($variant),*
        }

        impl $crate::core::Event for $name {
            type Kind = $kind;

            fn kind(&self) -> $kind {
                match self {
                    $(Self::$variant { .. } => $kind::$variant),*
                }
            }

            fn name(&self) -> &str {
                match self {
                    $(Self::$variant { .. } => stringify!($variant)),*
                }
            }
        }
    };
}
