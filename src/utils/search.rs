//! Nearest-value search over an ascending sequence.

/// Which neighbour(s) of the target to return
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchMode {
    /// The nearest element; on a tie the smaller one
    #[default]
    Closest,
    /// The element immediately below the insertion point of the target
    Lower,
    /// The element at the insertion point of the target
    Higher,
    /// Both elements bracketing the target
    Both,
}

/// Result of [`find_closest`]. Indices always refer to the first occurrence of the value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Neighbour {
    Single {
        value: f64,
        index: usize,
    },
    Pair {
        lower: f64,
        upper: f64,
        lower_index: usize,
        upper_index: usize,
    },
}

impl Neighbour {
    /// Index of a single match, or of the lower element of a pair
    pub fn index(&self) -> usize {
        match self {
            Neighbour::Single { index, .. } => *index,
            Neighbour::Pair { lower_index, .. } => *lower_index,
        }
    }

    /// Value of a single match, or of the lower element of a pair
    pub fn value(&self) -> f64 {
        match self {
            Neighbour::Single { value, .. } => *value,
            Neighbour::Pair { lower, .. } => *lower,
        }
    }
}

fn first_index_of(values: &[f64], value: f64) -> usize {
    values.partition_point(|&x| x < value)
}

/// Finds the element(s) of `values` near `target`. `values` must be sorted ascending.
///
/// A target at or below the first element returns the first element, and a target above the
/// last returns the last, whatever the mode. Returns `None` only for an empty slice.
pub fn find_closest(values: &[f64], target: f64, mode: SearchMode) -> Option<Neighbour> {
    let last = *values.last()?;
    let pos = values.partition_point(|&x| x < target);
    if pos == 0 {
        return Some(Neighbour::Single {
            value: values[0],
            index: 0,
        });
    }
    if pos == values.len() {
        return Some(Neighbour::Single {
            value: last,
            index: first_index_of(values, last),
        });
    }
    let before = values[pos - 1];
    let after = values[pos];
    let lower = Neighbour::Single {
        value: before,
        index: first_index_of(values, before),
    };
    let upper = Neighbour::Single {
        value: after,
        index: pos,
    };
    Some(match mode {
        SearchMode::Closest => {
            if after - target < target - before {
                upper
            } else {
                lower
            }
        }
        SearchMode::Lower => lower,
        SearchMode::Higher => upper,
        SearchMode::Both => Neighbour::Pair {
            lower: before,
            upper: after,
            lower_index: lower.index(),
            upper_index: pos,
        },
    })
}
