//! Keep policies and the partitioning of rolls into kept and dropped ones.

use alloc::vec::Vec;
use core::fmt;

/// Policy selecting which of a set of rolls count towards the total.
///
/// Every variant wraps the number of rolls to keep. Partitioning always works on rolls sorted in ascending order, see
/// [`KeepCount::partition()`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[expect(clippy::exhaustive_enums, reason = "The set of keep policies is closed")]
pub enum KeepCount {
	/// Keeps the highest x rolls (`h`).
	///
	/// # Examples
	/// ```
	/// use dicetrace::dice::KeepCount;
	///
	/// let (kept, dropped) = KeepCount::High(2).partition(&[1, 2, 3, 6]);
	/// assert_eq!(kept, [3, 6]);
	/// assert_eq!(dropped, [1, 2]);
	/// ```
	High(u32),

	/// Keeps the lowest x rolls (`l`).
	///
	/// # Examples
	/// ```
	/// use dicetrace::dice::KeepCount;
	///
	/// let (kept, dropped) = KeepCount::Low(2).partition(&[1, 2, 3, 6]);
	/// assert_eq!(kept, [1, 2]);
	/// assert_eq!(dropped, [3, 6]);
	/// ```
	Low(u32),

	/// Keeps x rolls from the middle, favouring the upper half when they can't be centered exactly (`mh`).
	///
	/// # Examples
	/// ```
	/// use dicetrace::dice::KeepCount;
	///
	/// let (kept, dropped) = KeepCount::MiddleHigh(1).partition(&[0, 1, 2, 3]);
	/// assert_eq!(kept, [2]);
	/// assert_eq!(dropped, [0, 1, 3]);
	/// ```
	MiddleHigh(u32),

	/// Keeps x rolls from the middle, favouring the lower half when they can't be centered exactly (`ml`).
	///
	/// # Examples
	/// ```
	/// use dicetrace::dice::KeepCount;
	///
	/// let (kept, dropped) = KeepCount::MiddleLow(1).partition(&[0, 1, 2, 3]);
	/// assert_eq!(kept, [1]);
	/// assert_eq!(dropped, [0, 2, 3]);
	/// ```
	MiddleLow(u32),
}

impl KeepCount {
	/// Number of rolls the policy keeps.
	#[must_use]
	pub const fn count(self) -> u32 {
		match self {
			Self::High(count) | Self::Low(count) | Self::MiddleHigh(count) | Self::MiddleLow(count) => count,
		}
	}

	/// Splits rolls sorted in ascending order into the kept and dropped ones, in that order.
	///
	/// Both halves preserve the ascending order of the input, so `kept` and `dropped` together are always a
	/// permutation of `sorted`. Keeping more rolls than there are keeps all of them, and keeping none drops all of
	/// them.
	///
	/// The middle policies split the rolls at their middle (the lower half getting the extra roll for an odd count),
	/// keep the highest of the lower half and the lowest of the upper half, and hand the odd kept roll to one of the
	/// halves based on the parity of both counts.
	#[must_use]
	pub fn partition<T: Copy>(self, sorted: &[T]) -> (Vec<T>, Vec<T>) {
		let len = sorted.len();
		let count = usize::try_from(self.count()).map_or(len, |count| count.min(len));

		match self {
			Self::High(..) => keep_high(sorted, count),
			Self::Low(..) => keep_low(sorted, count),
			Self::MiddleHigh(..) | Self::MiddleLow(..) if count == 0 => (Vec::new(), sorted.to_vec()),
			Self::MiddleHigh(..) | Self::MiddleLow(..) => {
				let (lower, upper) = sorted.split_at(len.div_ceil(2));
				let lower_count = self.lower_share(len, count);

				let (mut kept, mut dropped) = keep_high(lower, lower_count);
				let (upper_kept, upper_dropped) = keep_low(upper, count.saturating_sub(lower_count));
				kept.extend(upper_kept);
				dropped.extend(upper_dropped);
				(kept, dropped)
			}
		}
	}

	/// Number of kept rolls a middle policy takes from the lower half of `len` rolls.
	const fn lower_share(self, len: usize, count: usize) -> usize {
		let len_even = len % 2 == 0;
		let count_even = count % 2 == 0;
		let half = count / 2;

		match self {
			Self::MiddleLow(..) if len_even && count_even => half,
			Self::MiddleLow(..) => half.saturating_add(1),
			Self::MiddleHigh(..) if !len_even && !count_even => half.saturating_add(1),
			Self::MiddleHigh(..) | Self::High(..) | Self::Low(..) => half,
		}
	}
}

impl fmt::Display for KeepCount {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::High(count) => write!(f, "h{count}"),
			Self::Low(count) => write!(f, "l{count}"),
			Self::MiddleHigh(count) => write!(f, "mh{count}"),
			Self::MiddleLow(count) => write!(f, "ml{count}"),
		}
	}
}

/// Keeps the last `count` of the sorted rolls.
fn keep_high<T: Copy>(sorted: &[T], count: usize) -> (Vec<T>, Vec<T>) {
	let (dropped, kept) = sorted.split_at(sorted.len().saturating_sub(count));
	(kept.to_vec(), dropped.to_vec())
}

/// Keeps the first `count` of the sorted rolls.
fn keep_low<T: Copy>(sorted: &[T], count: usize) -> (Vec<T>, Vec<T>) {
	let (kept, dropped) = sorted.split_at(count.min(sorted.len()));
	(kept.to_vec(), dropped.to_vec())
}
