//! Interactive confirmation.

use std::io::{self, Write};
use std::path::Path;

/// Ask before replacing an existing build folder. Anything but `y`/`yes` declines.
pub fn confirm_overwrite(path: &Path) -> io::Result<bool> {
    eprint!("`{}` exists. Overwrite? [y/N] ", path.display());
    io::stderr().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(is_yes(&input))
}

fn is_yes(input: &str) -> bool {
    let input = input.trim().to_lowercase();
    input == "y" || input == "yes"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_yes() {
        assert!(is_yes("y\n"));
        assert!(is_yes(" YES "));
        assert!(!is_yes("\n"));
        assert!(!is_yes("no"));
        assert!(!is_yes("yep"));
    }
}
