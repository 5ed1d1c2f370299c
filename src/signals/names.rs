/*!
 * Signal Name Resolution
 *
 * Maps symbolic signal names to the signals of the running platform.
 *
 * Names follow one convention: uppercase, without the `SIG` prefix
 * (`"INT"`, `"TERM"`, `"USR1"`). Lookups are exact; `"int"` and
 * `"SIGINT"` are unknown names. Unknown names resolve to nothing and are
 * never an error.
 */

use super::mask::{mask_contains, mask_of};
use ahash::AHashMap;
use nix::sys::signal::{SigSet, Signal};
use std::collections::BTreeSet;
use std::sync::LazyLock;

/// Process-wide name table, built from the platform signal enumeration on first use
static SIGNAL_TABLE: LazyLock<SignalTable> = LazyLock::new(SignalTable::from_platform);

/// Alternate names some platforms accept for an existing signal
#[cfg(any(target_os = "linux", target_os = "android"))]
const ALIASES: &[(&str, Signal)] = &[
    ("IOT", Signal::SIGABRT),
    ("CLD", Signal::SIGCHLD),
    ("POLL", Signal::SIGIO),
];

#[cfg(not(any(target_os = "linux", target_os = "android")))]
const ALIASES: &[(&str, Signal)] = &[("IOT", Signal::SIGABRT)];

/// Immutable name -> signal number mapping
///
/// Holds the standard signals plus, on Linux, the realtime range as
/// `RTMIN`, `NUM<n>` ... `RTMAX`.
#[derive(Debug)]
pub struct SignalTable {
    by_name: AHashMap<String, i32>,
    by_number: AHashMap<i32, String>,
    canonical: Vec<String>,
}

impl SignalTable {
    fn from_platform() -> Self {
        let mut table = Self {
            by_name: AHashMap::with_capacity(80),
            by_number: AHashMap::with_capacity(72),
            canonical: Vec::with_capacity(72),
        };

        for signal in Signal::iterator() {
            table.add(canonical_name(signal).to_string(), signal as i32);
        }
        for (name, number) in realtime_signals() {
            table.add(name, number);
        }
        for &(alias, signal) in ALIASES {
            table
                .by_name
                .entry(alias.to_string())
                .or_insert(signal as i32);
        }

        table.canonical.sort_unstable();
        tracing::debug!(
            signals = table.canonical.len(),
            entries = table.by_name.len(),
            "signal name table built"
        );

        table
    }

    fn add(&mut self, name: String, number: i32) {
        self.by_number.entry(number).or_insert_with(|| name.clone());
        self.by_name.insert(name.clone(), number);
        self.canonical.push(name);
    }

    /// Number for a name
    #[inline]
    pub fn get(&self, name: &str) -> Option<i32> {
        self.by_name.get(name).copied()
    }

    /// Canonical name for a number
    #[inline]
    pub fn name_of(&self, number: i32) -> Option<&str> {
        self.by_number.get(&number).map(String::as_str)
    }

    /// Every signal number in the table, ascending
    pub fn numbers(&self) -> BTreeSet<i32> {
        self.by_number.keys().copied().collect()
    }
}

/// The process-wide signal name table
pub fn table() -> &'static SignalTable {
    &SIGNAL_TABLE
}

fn canonical_name(signal: Signal) -> &'static str {
    let full = signal.as_str();
    full.strip_prefix("SIG").unwrap_or(full)
}

/// Realtime signals, named after the bounds the C library reports
#[cfg(target_os = "linux")]
fn realtime_signals() -> Vec<(String, i32)> {
    let (min, max) = (nix::libc::SIGRTMIN(), nix::libc::SIGRTMAX());
    (min..=max)
        .map(|number| {
            let name = match number {
                n if n == min => "RTMIN".to_string(),
                n if n == max => "RTMAX".to_string(),
                n => format!("NUM{n}"),
            };
            (name, number)
        })
        .collect()
}

#[cfg(not(target_os = "linux"))]
fn realtime_signals() -> Vec<(String, i32)> {
    Vec::new()
}

/// Resolve signal names to a set of platform signals
///
/// Unknown names are skipped. `KILL` and `STOP` translate like any other
/// name; the OS drops them when the mask is installed.
pub fn resolve<I, S>(names: I) -> SignalSet
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let table = table();
    let mut set = SignalSet::new();

    for name in names {
        let name = name.as_ref();
        match table.get(name) {
            Some(number) => set.insert(number),
            None => tracing::trace!(name, "ignoring unknown signal name"),
        }
    }

    set
}

/// Platform number for a signal name
pub fn signal_number(name: &str) -> Option<i32> {
    table().get(name)
}

/// Canonical name (no `SIG` prefix) for a signal
pub fn signal_name(signal: Signal) -> &'static str {
    canonical_name(signal)
}

/// All canonical names known to this platform, sorted
pub fn known_names() -> Vec<&'static str> {
    table().canonical.iter().map(String::as_str).collect()
}

/// Ordered, duplicate-free set of signal numbers
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SignalSet {
    numbers: BTreeSet<i32>,
}

impl SignalSet {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn insert(&mut self, number: i32) {
        self.numbers.insert(number);
    }

    #[inline]
    pub fn contains(&self, number: i32) -> bool {
        self.numbers.contains(&number)
    }

    pub fn len(&self) -> usize {
        self.numbers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.numbers.is_empty()
    }

    /// Signal numbers in ascending order
    pub fn numbers(&self) -> impl Iterator<Item = i32> + '_ {
        self.numbers.iter().copied()
    }

    /// Canonical names in signal-number order
    pub fn names(&self) -> Vec<&'static str> {
        let table = table();
        self.numbers().filter_map(|n| table.name_of(n)).collect()
    }

    /// Build the OS mask holding exactly these signals
    pub fn to_mask(&self) -> SigSet {
        mask_of(self.numbers())
    }

    /// Known signals contained in an OS mask
    pub fn from_mask(mask: &SigSet) -> Self {
        table()
            .numbers()
            .into_iter()
            .filter(|&n| mask_contains(mask, n))
            .collect()
    }
}

impl FromIterator<i32> for SignalSet {
    fn from_iter<T: IntoIterator<Item = i32>>(iter: T) -> Self {
        Self {
            numbers: iter.into_iter().collect(),
        }
    }
}

impl FromIterator<Signal> for SignalSet {
    fn from_iter<T: IntoIterator<Item = Signal>>(iter: T) -> Self {
        iter.into_iter().map(|signal| signal as i32).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_resolve_common_names() {
        let set = resolve(["INT", "TERM", "HUP"]);
        assert_eq!(set.len(), 3);
        assert!(set.contains(Signal::SIGINT as i32));
        assert!(set.contains(Signal::SIGTERM as i32));
        assert!(set.contains(Signal::SIGHUP as i32));
    }

    #[test]
    fn test_resolve_ignores_unknown() {
        let set = resolve(["INT", "NOT_A_SIGNAL", "", "int", "SIGTERM"]);
        assert_eq!(set.names(), vec!["INT"]);
    }

    #[test]
    fn test_resolve_collapses_duplicates() {
        let set = resolve(["USR1", "USR1", "USR2", "USR1"]);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_resolve_empty() {
        let names: [&str; 0] = [];
        assert!(resolve(names).is_empty());
    }

    #[test]
    fn test_reserved_names_translate() {
        let set = resolve(["KILL", "STOP"]);
        assert!(set.contains(Signal::SIGKILL as i32));
        assert!(set.contains(Signal::SIGSTOP as i32));
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn test_aliases() {
        assert_eq!(signal_number("IOT"), signal_number("ABRT"));
        assert_eq!(signal_number("CLD"), signal_number("CHLD"));
        assert_eq!(signal_number("POLL"), signal_number("IO"));
    }

    #[test]
    fn test_signal_number_matches_platform() {
        assert_eq!(signal_number("INT"), Some(Signal::SIGINT as i32));
        assert_eq!(signal_number("KILL"), Some(Signal::SIGKILL as i32));
        assert_eq!(signal_number("BOGUS"), None);
    }

    #[test]
    fn test_known_names_sorted_without_prefix() {
        let names = known_names();
        assert!(names.contains(&"INT"));
        assert!(names.iter().all(|n| !n.starts_with("SIG")));
        assert!(names.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_mask_conversion() {
        let set = resolve(["INT", "USR2"]);
        let mask = set.to_mask();
        assert!(mask.contains(Signal::SIGINT));
        assert!(mask.contains(Signal::SIGUSR2));
        assert!(!mask.contains(Signal::SIGTERM));
        assert_eq!(SignalSet::from_mask(&mask), set);
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn test_realtime_names_resolve() {
        let (min, max) = (nix::libc::SIGRTMIN(), nix::libc::SIGRTMAX());
        assert_eq!(signal_number("RTMIN"), Some(min));
        assert_eq!(signal_number("RTMAX"), Some(max));
        assert_eq!(signal_number(&format!("NUM{}", min + 1)), Some(min + 1));
        assert_eq!(signal_number(&format!("NUM{min}")), None);

        let set = resolve(["RTMIN", "RTMAX", "INT"]);
        assert_eq!(set.len(), 3);
        assert!(set.contains(min));
        assert!(set.contains(max));

        let names = known_names();
        assert!(names.contains(&"RTMIN"));
        assert!(names.contains(&"RTMAX"));
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn test_realtime_mask_conversion() {
        let set = resolve(["RTMIN", "USR1"]);
        let mask = set.to_mask();
        assert!(mask.contains(Signal::SIGUSR1));
        assert!(mask_contains(&mask, nix::libc::SIGRTMIN()));
        assert_eq!(SignalSet::from_mask(&mask), set);
        assert_eq!(set.names(), vec!["USR1", "RTMIN"]);
    }
}
