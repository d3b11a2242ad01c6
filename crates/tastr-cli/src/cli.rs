use std::path::PathBuf;

use clap::Parser;

/// Run a simulated blind taste test and print the resulting leaderboard.
#[derive(Debug, Parser)]
#[command(name = "tastr", version, about)]
pub struct Cli {
    /// Extra TOML config, applied over ./tastr.toml
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// -v info, -vv debug, -vvv trace (RUST_LOG wins when set)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[arg(long, default_value = "Treats")]
    pub category: String,

    /// Item names, comma separated. Later items are secretly tastier.
    #[arg(long, value_delimiter = ',', default_value = "Cake,IceCream,Pie")]
    pub items: Vec<String>,

    #[arg(long, default_value_t = 4)]
    pub tasters: usize,

    #[arg(long, default_value_t = 5)]
    pub rounds: u32,

    /// Seed every shuffle and every simulated choice
    #[arg(long)]
    pub seed: Option<u64>,

    /// Print the leaderboard as JSON
    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cli = Cli::parse_from(["tastr"]);
        assert_eq!(cli.items, vec!["Cake", "IceCream", "Pie"]);
        assert_eq!(cli.tasters, 4);
        assert_eq!(cli.rounds, 5);
        assert!(cli.seed.is_none());
    }

    #[test]
    fn items_split_on_commas() {
        let cli = Cli::parse_from(["tastr", "--items", "Tea,Coffee", "-vv", "--seed", "7"]);
        assert_eq!(cli.items, vec!["Tea", "Coffee"]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.seed, Some(7));
    }
}
