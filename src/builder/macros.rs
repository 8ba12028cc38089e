//! Macros for ergonomic machine construction.

/// Declare an event enum and implement [`Event`](crate::core::Event) for it.
///
/// Every variant is mapped to its type tag, the key its transitions are
/// declared under. `Clone` and `Debug` are derived; add other derives with
/// attributes on the enum.
///
/// # Example
///
/// ```
/// use harel::core::Event;
/// use harel::event_enum;
///
/// event_enum! {
///     #[derive(PartialEq)]
///     pub enum GameEvent {
///         Start => "START",
///         Play(char) => "PLAY",
///         TurnMade { selected_index: usize } => "TURN_MADE",
///     }
/// }
///
/// assert_eq!(GameEvent::Start.event_type(), "START");
/// assert_eq!(GameEvent::TurnMade { selected_index: 2 }.event_type(), "TURN_MADE");
/// ```
#[macro_export]
macro_rules! event_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident
                $( ( $($tuple:ty),* $(,)? ) )?
                $( { $($field:ident : $field_ty:ty),* $(,)? } )?
                => $tag:literal
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Debug)]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant
                $( ( $($tuple),* ) )?
                $( { $($field : $field_ty),* } )?
            ),*
        }

        impl $crate::core::Event for $name {
            fn event_type(&self) -> &str {
                match self {
                    $(Self::$variant { .. } => $tag,)*
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::core::{Event, Trigger};

    event_enum! {
        #[derive(PartialEq)]
        enum PingPong {
            Ping => "PING",
            Pong => "PONG",
            Score(u32, u32) => "SCORE",
            Rally { hits: usize } => "RALLY",
        }
    }

    #[test]
    fn event_enum_maps_every_variant() {
        assert_eq!(PingPong::Ping.event_type(), "PING");
        assert_eq!(PingPong::Pong.event_type(), "PONG");
        assert_eq!(PingPong::Score(1, 0).event_type(), "SCORE");
        assert_eq!(PingPong::Rally { hits: 3 }.event_type(), "RALLY");
    }

    #[test]
    fn event_enum_derives_clone_and_debug() {
        let event = PingPong::Rally { hits: 3 };

        assert_eq!(event.clone(), event);
        assert_eq!(format!("{:?}", PingPong::Ping), "Ping");
        assert_eq!(Trigger::of(&event), Trigger::event("RALLY"));
    }

    #[test]
    fn event_enum_supports_visibility() {
        event_enum! {
            pub enum Public {
                Enable => "ENABLE",
            }
        }

        assert_eq!(Public::Enable.event_type(), "ENABLE");
    }
}
