//! Pelada CLI Tool
//!
//! Offline calculations without a running service.
//!
//! Usage:
//!   cargo run --bin pelada-cli -- --help
//!   cargo run --bin pelada-cli quick --stars 4,5,3,4,2,4 --position Ataque
//!   cargo run --bin pelada-cli overall --file players.json
//!   cargo run --bin pelada-cli standings --file matches.json --tournament 3

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use pelada::rating::calculate_overall;
use pelada::standings::build_standings;
use pelada::types::{MatchRecord, PlayerAttributes, PositionProfile, TeamId};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "pelada-cli")]
#[command(about = "Compute pelada overall ratings and tournament standings from the command line")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Rate one player from 0-5 star values
    Quick {
        /// Six comma-separated star values: speed,finishing,passing,dribbling,defense,physical
        #[arg(short, long)]
        stars: String,
        /// Sportsmanship stars
        #[arg(long)]
        sportsmanship: Option<u8>,
        /// Position label, repeatable (Ataque, Meio, Defesa, Goleiro)
        #[arg(short, long)]
        position: Vec<String>,
        /// Rate as goalkeeper regardless of positions
        #[arg(short, long)]
        goalkeeper: bool,
    },
    /// Rate every player listed in a JSON file
    Overall {
        /// File with an array of {name, attributes, profile}
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Rank teams from the matches in a JSON file
    Standings {
        /// File with {matches, teams?}
        #[arg(short, long)]
        file: PathBuf,
        /// Tournament whose matches are counted
        #[arg(short, long)]
        tournament: u64,
    },
}

#[derive(Debug, Deserialize)]
struct PlayerInput {
    #[serde(default)]
    name: Option<String>,
    attributes: PlayerAttributes,
    #[serde(default)]
    profile: PositionProfile,
}

#[derive(Debug, Serialize)]
struct PlayerOutput {
    name: String,
    role: Option<String>,
    overall: u8,
}

#[derive(Debug, Deserialize)]
struct StandingsInput {
    #[serde(default)]
    matches: Vec<MatchRecord>,
    #[serde(default)]
    teams: Option<Vec<TeamId>>,
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse {}", path.display()))
}

fn parse_stars(raw: &str) -> Result<[u8; 6]> {
    let values: Vec<u8> = raw
        .split(',')
        .map(|part| part.trim().parse::<u8>())
        .collect::<std::result::Result<_, _>>()
        .map_err(|_| anyhow!("Star values must be numbers between 0 and 5"))?;

    let stars: [u8; 6] = values
        .try_into()
        .map_err(|_| anyhow!("Expected exactly six star values"))?;
    if stars.iter().any(|v| *v > 5) {
        return Err(anyhow!("Star values must be numbers between 0 and 5"));
    }
    Ok(stars)
}

fn rate(name: String, attributes: &PlayerAttributes, profile: &PositionProfile) -> PlayerOutput {
    let result = calculate_overall(attributes, profile);
    PlayerOutput {
        name,
        role: result.role.map(|role| role.to_string()),
        overall: result.overall,
    }
}

fn print_players(players: &[PlayerOutput], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(players)?);
        return Ok(());
    }

    for player in players {
        println!(
            "{:<20} {:<12} {:>3}",
            player.name,
            player.role.as_deref().unwrap_or("-"),
            player.overall
        );
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Quick {
            stars,
            sportsmanship,
            position,
            goalkeeper,
        } => {
            let attributes = PlayerAttributes::from_star_scale(parse_stars(&stars)?, sportsmanship);
            let profile = PositionProfile::from_labels(goalkeeper, position.as_slice());
            if !goalkeeper && profile.positions.len() < position.len() {
                eprintln!("⚠️  Some position labels were not recognised");
            }

            let player = rate("player".to_string(), &attributes, &profile);
            print_players(&[player], cli.json)?;
        }

        Commands::Overall { file } => {
            let inputs: Vec<PlayerInput> = read_json(&file)?;
            let players: Vec<PlayerOutput> = inputs
                .into_iter()
                .enumerate()
                .map(|(i, input)| {
                    let name = input.name.unwrap_or_else(|| format!("player {}", i + 1));
                    rate(name, &input.attributes, &input.profile)
                })
                .collect();
            print_players(&players, cli.json)?;
        }

        Commands::Standings { file, tournament } => {
            let input: StandingsInput = read_json(&file)?;
            let rows = build_standings(tournament, &input.matches, input.teams.as_deref());

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
                return Ok(());
            }

            println!(
                "{:>3}  {:<8} {:>2} {:>2} {:>2} {:>2} {:>4} {:>4} {:>4} {:>4}",
                "#", "team", "P", "W", "D", "L", "GF", "GA", "GD", "PTS"
            );
            for (i, row) in rows.iter().enumerate() {
                println!(
                    "{:>3}  {:<8} {:>2} {:>2} {:>2} {:>2} {:>4} {:>4} {:>4} {:>4}",
                    i + 1,
                    row.team_id,
                    row.played,
                    row.won,
                    row.drawn,
                    row.lost,
                    row.goals_for,
                    row.goals_against,
                    row.goal_difference,
                    row.points
                );
            }
        }
    }

    Ok(())
}
