//! Integer record identifiers.
//!
//! Every collection numbers its records `max + 1`, starting at 1. Repositories
//! call [`next_id`] while holding the collection lock so the sequence is
//! strictly increasing and never reuses a live id.

/// Records that carry a positive integer identifier.
pub trait Identified {
    /// Raw identifier value.
    fn raw_id(&self) -> u64;
}

/// Identifier for the next record appended to `records`.
///
/// # Examples
/// ```
/// use medrep::domain::{Identified, next_id};
///
/// struct Row(u64);
/// impl Identified for Row {
///     fn raw_id(&self) -> u64 { self.0 }
/// }
///
/// assert_eq!(next_id::<Row>(&[]), 1);
/// assert_eq!(next_id(&[Row(4), Row(2)]), 5);
/// ```
pub fn next_id<T: Identified>(records: &[T]) -> u64 {
    records
        .iter()
        .map(Identified::raw_id)
        .max()
        .map_or(1, |max| max.saturating_add(1))
}

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize,
            ::utoipa::ToSchema,
        )]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Wrap a raw identifier.
            pub const fn new(raw: u64) -> Self {
                Self(raw)
            }

            /// Raw identifier value.
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                ::std::fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

pub(crate) use record_id;

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    struct Row(u64);

    impl Identified for Row {
        fn raw_id(&self) -> u64 {
            self.0
        }
    }

    #[rstest]
    #[case(&[], 1)]
    #[case(&[1], 2)]
    #[case(&[3, 9, 4], 10)]
    fn next_id_is_max_plus_one(#[case] ids: &[u64], #[case] expected: u64) {
        let rows: Vec<Row> = ids.iter().copied().map(Row).collect();
        assert_eq!(next_id(&rows), expected);
    }

    #[rstest]
    fn sequential_assignment_is_strictly_increasing() {
        let mut rows = Vec::new();
        for _ in 0..5 {
            let id = next_id(&rows);
            rows.push(Row(id));
        }
        let ids: Vec<u64> = rows.iter().map(|row| row.0).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }
}
