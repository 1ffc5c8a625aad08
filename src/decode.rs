// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
//! Per-format decoders. Layouts vary across hardware generations, so each decoder
//! is an ordered chain of strategies: the first one to produce something wins and
//! a failed guess simply falls through to the next.

use tracing::debug;

pub mod kmp;
pub mod ksf;
pub mod pcg;
pub mod pcm;

/// One way of reading a buffer. `run` returns `None` when its preconditions don't
/// hold for this buffer.
pub struct Strategy<C: ?Sized, T> {
    pub name: &'static str,
    pub run: fn(&[u8], &C) -> Option<T>,
}

/// Runs `chain` in order and returns the first result produced.
pub fn first_success<C: ?Sized, T>(
    label: &str,
    data: &[u8],
    context: &C,
    chain: &[Strategy<C, T>],
) -> Option<T> {
    for strategy in chain {
        if let Some(result) = (strategy.run)(data, context) {
            debug!(container = label, strategy = strategy.name, "Decode strategy matched");
            return Some(result);
        }
        debug!(container = label, strategy = strategy.name, "Decode strategy fell through");
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn never(_: &[u8], _: &u8) -> Option<&'static str> {
        None
    }

    fn if_long(data: &[u8], min: &u8) -> Option<&'static str> {
        (data.len() >= usize::from(*min)).then_some("long")
    }

    fn always(_: &[u8], _: &u8) -> Option<&'static str> {
        Some("always")
    }

    #[test]
    fn test_first_success_respects_order() {
        let chain = [
            Strategy { name: "never", run: never },
            Strategy { name: "if_long", run: if_long },
            Strategy { name: "always", run: always },
        ];
        assert_eq!(first_success("t", &[0; 8], &4, &chain), Some("long"));
        assert_eq!(first_success("t", &[0; 2], &4, &chain), Some("always"));
        assert_eq!(first_success("t", &[0; 2], &4, &chain[..2]), None);
    }
}
