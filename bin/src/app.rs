//! Application options

use clap::{Parser, Subcommand};
use texcore::filter::FilterType;
use texcore::math::Float;
use texcore::texfile::WrapMode;

/// Command line options.
#[derive(Parser, Clone, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Options {
    /// Directories searched for texture names.
    #[arg(
        long = "searchpath",
        short = 's',
        value_name = "DIRS",
        default_value = "",
        help = "Directories searched for textures, separated by ':' or ';'."
    )]
    pub search_path: String,

    /// Tile memory budget in bytes.
    #[arg(
        long = "max-memory",
        short = 'm',
        value_name = "BYTES",
        default_value = "256M",
        value_parser = parse_memory_size,
        help = "Tile memory budget; accepts k, M and G suffixes."
    )]
    pub max_memory: i64,

    /// Extra filter width as a fraction of the texture size.
    #[arg(long, value_name = "FLOAT", default_value_t = 0.0, help = "Extra filter width in s and t.")]
    pub blur: Float,

    /// Footprint width multiplier.
    #[arg(long, value_name = "FLOAT", default_value_t = 1.0, help = "Footprint width multiplier in s and t.")]
    pub width: Float,

    /// Filter function.
    #[arg(
        long,
        value_name = "NAME",
        default_value = "gaussian",
        help = "Filter: box, triangle, gaussian, catmull-rom, sinc or disk."
    )]
    pub filter: FilterType,

    /// Wrap mode override in s.
    #[arg(long, value_name = "MODE", help = "Wrap mode in s: black, periodic, clamp or trunc.")]
    pub swrap: Option<WrapMode>,

    /// Wrap mode override in t.
    #[arg(long, value_name = "MODE", help = "Wrap mode in t: black, periodic, clamp or trunc.")]
    pub twrap: Option<WrapMode>,

    /// What to do.
    #[command(subcommand)]
    pub command: Command,
}

/// Sub-commands.
#[derive(Subcommand, Clone, Debug)]
pub enum Command {
    /// Print the header of a texture.
    Info {
        /// Texture name.
        file: String,
    },

    /// Filter a texture over a footprint and print the channel values.
    Sample {
        /// Texture name.
        file: String,

        /// Footprint centre in s.
        #[arg(allow_negative_numbers = true)]
        s: Float,

        /// Footprint centre in t.
        #[arg(allow_negative_numbers = true)]
        t: Float,

        /// Footprint width in s.
        #[arg(long, default_value_t = 0.0)]
        ds: Float,

        /// Footprint height in t.
        #[arg(long, default_value_t = 0.0)]
        dt: Float,
    },
}

/// Parses a byte count with an optional `k`, `M` or `G` suffix (powers of
/// 1024).
///
/// * `s` - The value.
pub fn parse_memory_size(s: &str) -> Result<i64, String> {
    let s = s.trim();
    let (digits, multiplier) = match s.chars().last() {
        Some('k') | Some('K') => (&s[..s.len() - 1], 1_i64 << 10),
        Some('m') | Some('M') => (&s[..s.len() - 1], 1_i64 << 20),
        Some('g') | Some('G') => (&s[..s.len() - 1], 1_i64 << 30),
        _ => (s, 1),
    };
    let n: i64 = digits
        .trim()
        .parse()
        .map_err(|_| format!("invalid memory size '{s}'"))?;
    if n < 0 {
        return Err(format!("negative memory size '{s}'"));
    }
    n.checked_mul(multiplier)
        .ok_or_else(|| format!("memory size '{s}' is too large"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_sizes() {
        assert_eq!(parse_memory_size("1000"), Ok(1000));
        assert_eq!(parse_memory_size("4k"), Ok(4096));
        assert_eq!(parse_memory_size("2M"), Ok(2 << 20));
        assert_eq!(parse_memory_size("1G"), Ok(1 << 30));
        assert!(parse_memory_size("lots").is_err());
        assert!(parse_memory_size("-5k").is_err());
    }

    #[test]
    fn parses_sample_command() {
        let options = Options::parse_from([
            "texsys",
            "--filter",
            "box",
            "--swrap",
            "periodic",
            "sample",
            "grid.exr",
            "0.25",
            "0.5",
            "--ds",
            "0.1",
        ]);
        assert_eq!(options.filter, FilterType::Box);
        assert_eq!(options.swrap, Some(WrapMode::Periodic));
        assert_eq!(options.max_memory, 256 << 20);
        match options.command {
            Command::Sample { file, s, t, ds, dt } => {
                assert_eq!(file, "grid.exr");
                assert_eq!((s, t, ds, dt), (0.25, 0.5, 0.1, 0.0));
            }
            _ => panic!("expected sample"),
        }
    }
}
