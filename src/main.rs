//! # file-mover CLI
//!
//! Command-line interface for the smart file mover.
//!
//! ## Usage
//! ```bash
//! file-mover organize ~/Downloads --dest ~/Organized
//! file-mover organize ~/Downloads ~/Desktop --dest ~/Organized --mode move
//! file-mover organize ~/Downloads --dest ~/Organized --resume
//! ```

mod cli;

use smart_file_mover::Result;

fn main() -> Result<()> {
    cli::run()
}
