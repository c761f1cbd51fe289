//! Buffering event list parsing.
//!
//! Accepts `[[x1,y1],[x2,y2]]`, `[x1,y1]` and the bracket-less `x1,y1` /
//! `[x1,y1],[x2,y2]` forms. Each parse strategy is tried in order and the
//! first one that yields a valid list wins.

use serde::Deserialize;

use super::error::{StallError, StallResult};

/// A single stall: freeze at `position` for `duration`, both in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Event {
    pub position: f64,
    pub duration: f64,
}

/// Validated, chronologically ordered buffering events.
#[derive(Debug, Clone, PartialEq)]
pub struct EventList {
    events: Vec<Event>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawEventList {
    Pairs(Vec<Vec<f64>>),
    Single(Vec<f64>),
}

type ParseStrategy = fn(&str) -> Result<RawEventList, String>;

const STRATEGIES: &[(&str, ParseStrategy)] = &[
    ("strict", parse_strict),
    ("bracket-wrapped", parse_wrapped),
];

fn parse_strict(raw: &str) -> Result<RawEventList, String> {
    serde_json::from_str(raw).map_err(|err| err.to_string())
}

fn parse_wrapped(raw: &str) -> Result<RawEventList, String> {
    serde_json::from_str(&format!("[{raw}]")).map_err(|err| err.to_string())
}

impl EventList {
    /// Parse the textual event list.
    pub fn parse(raw: &str) -> StallResult<Self> {
        let mut first_failure: Option<String> = None;

        for (name, strategy) in STRATEGIES {
            let attempt = strategy(raw).and_then(pairs_from_raw);
            match attempt {
                Ok(pairs) => return Self::from_pairs_for(raw, &pairs),
                Err(reason) => {
                    first_failure.get_or_insert_with(|| format!("{name} parse: {reason}"));
                }
            }
        }

        Err(StallError::malformed(
            raw,
            first_failure.unwrap_or_else(|| "no parse strategy matched".to_string()),
        ))
    }

    /// Build from already structured `(position, duration)` pairs.
    #[cfg(test)]
    pub fn from_pairs(pairs: &[(f64, f64)]) -> StallResult<Self> {
        let raw = format!("{pairs:?}");
        Self::from_pairs_for(&raw, pairs)
    }

    fn from_pairs_for(raw: &str, pairs: &[(f64, f64)]) -> StallResult<Self> {
        if pairs.is_empty() {
            return Err(StallError::malformed(raw, "event list is empty"));
        }

        let mut events = Vec::with_capacity(pairs.len());
        for (index, &(position, duration)) in pairs.iter().enumerate() {
            if !position.is_finite() || position < 0.0 {
                return Err(StallError::malformed(
                    raw,
                    format!("event {index} has invalid position {position}"),
                ));
            }
            if !duration.is_finite() || duration <= 0.0 {
                return Err(StallError::malformed(
                    raw,
                    format!("event {index} has non-positive duration {duration}"),
                ));
            }
            if let Some(previous) = events.last().map(|e: &Event| e.position)
                && position < previous
            {
                return Err(StallError::UnorderedEvents {
                    index,
                    position,
                    previous,
                });
            }
            events.push(Event { position, duration });
        }

        Ok(Self { events })
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn total_duration(&self) -> f64 {
        self.events.iter().map(|e| e.duration).sum()
    }
}

fn pairs_from_raw(parsed: RawEventList) -> Result<Vec<(f64, f64)>, String> {
    let lists = match parsed {
        RawEventList::Pairs(lists) => lists,
        // a flat [x, y] is a single event
        RawEventList::Single(flat) => vec![flat],
    };

    lists
        .into_iter()
        .enumerate()
        .map(|(index, pair)| match pair.as_slice() {
            [position, duration] => Ok((*position, *duration)),
            other => Err(format!(
                "event {index} must have exactly two values, found {}",
                other.len()
            )),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn positions(list: &EventList) -> Vec<(f64, f64)> {
        list.events()
            .iter()
            .map(|e| (e.position, e.duration))
            .collect()
    }

    #[test]
    fn parses_nested_list() {
        let list = EventList::parse("[[0, 2], [5, 1]]").unwrap();
        assert_eq!(positions(&list), vec![(0.0, 2.0), (5.0, 1.0)]);
    }

    #[test]
    fn bare_pair_matches_nested_form() {
        let bare = EventList::parse("0,2").unwrap();
        let nested = EventList::parse("[[0,2]]").unwrap();
        assert_eq!(bare, nested);
    }

    #[test]
    fn flat_pair_is_promoted() {
        let list = EventList::parse("[1.5, 0.5]").unwrap();
        assert_eq!(positions(&list), vec![(1.5, 0.5)]);
    }

    #[test]
    fn bracketless_pair_list_is_wrapped() {
        let list = EventList::parse("[0, 1], [5, 10]").unwrap();
        assert_eq!(positions(&list), vec![(0.0, 1.0), (5.0, 10.0)]);
    }

    #[test]
    fn unbalanced_brackets_are_rejected() {
        let err = EventList::parse("[[0,2]").unwrap_err();
        match err {
            StallError::MalformedEventList { raw, reason } => {
                assert_eq!(raw, "[[0,2]");
                assert!(reason.starts_with("strict parse"), "{reason}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn empty_list_is_rejected() {
        assert!(matches!(
            EventList::parse("[]"),
            Err(StallError::MalformedEventList { .. })
        ));
    }

    #[test]
    fn wrong_arity_is_rejected() {
        assert!(matches!(
            EventList::parse("[[0, 1, 2]]"),
            Err(StallError::MalformedEventList { .. })
        ));
    }

    #[test]
    fn negative_position_and_zero_duration_are_rejected() {
        assert!(EventList::parse("[[-1, 2]]").is_err());
        assert!(EventList::parse("[[1, 0]]").is_err());
        assert!(EventList::parse("[[1, \"2\"]]").is_err());
    }

    #[test]
    fn out_of_order_events_are_rejected() {
        let err = EventList::parse("[[5, 1], [2, 1]]").unwrap_err();
        assert!(matches!(err, StallError::UnorderedEvents { index: 1, .. }));
    }

    #[test]
    fn structured_pairs_share_validation() {
        let list = EventList::from_pairs(&[(0.0, 2.0), (5.0, 1.0)]).unwrap();
        assert_eq!(list.events().len(), 2);
        assert_eq!(list.total_duration(), 3.0);
        assert!(EventList::from_pairs(&[]).is_err());
    }
}
