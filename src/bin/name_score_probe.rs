// src/bin/name_score_probe.rs
//
// Prints how the match cascade scores a query name against candidate names:
// the normalized forms, every pass's score per candidate, and the decision.
// Used to sanity-check thresholds against real name variants.

use anyhow::{bail, Result};
use clap::Parser;
use log::info;

use dedupe_lib::matching::matcher::{EntityMatcher, DEFAULT_EDIT_THRESHOLD, DEFAULT_TOKEN_THRESHOLD};
use dedupe_lib::matching::normalize::normalize;
use dedupe_lib::utils::env::load_env;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct ProbeArgs {
    /// Name to resolve
    query: String,

    /// Candidate names; each gets its position as entity id
    #[arg(required = true)]
    candidates: Vec<String>,

    /// Token overlap threshold
    #[arg(long, default_value_t = DEFAULT_TOKEN_THRESHOLD)]
    token_threshold: f64,

    /// Edit-distance ratio threshold
    #[arg(long, default_value_t = DEFAULT_EDIT_THRESHOLD)]
    edit_threshold: f64,
}

fn main() -> Result<()> {
    load_env();
    env_logger::init();

    let args = ProbeArgs::parse();
    for t in [args.token_threshold, args.edit_threshold] {
        if !(0.0..=1.0).contains(&t) {
            bail!("Thresholds must be between 0 and 1, got {}", t);
        }
    }
    let matcher = EntityMatcher::new(args.token_threshold, args.edit_threshold);
    info!(
        "Probing '{}' against {} candidates",
        args.query,
        args.candidates.len()
    );

    let query = normalize(&args.query);
    println!("query: {:?} -> {:?}", args.query, query);

    let ids: Vec<String> = (1..=args.candidates.len()).map(|i| i.to_string()).collect();
    let normalized: Vec<String> = args.candidates.iter().map(|c| normalize(c)).collect();

    print!("{:<4} {:<32}", "id", "candidate");
    for pass in matcher.passes() {
        print!(" {:>14}", format!("{} ({:.2})", short_name(pass.name()), pass.threshold()));
    }
    println!();
    for ((id, raw), name) in ids.iter().zip(&args.candidates).zip(&normalized) {
        print!("{:<4} {:<32}", id, truncate(raw, 32));
        for pass in matcher.passes() {
            print!(" {:>14.3}", pass.score_normalized(&query, name));
        }
        println!();
    }

    let decision = matcher.best_match_normalized(
        &query,
        ids.iter().map(String::as_str).zip(normalized.iter().map(String::as_str)),
    );
    match decision {
        Some(d) => println!(
            "decision: match -> {} ({:?}) via {} at {:.3}",
            d.entity_id,
            ids.iter()
                .position(|id| *id == d.entity_id)
                .map_or("", |i| args.candidates[i].as_str()),
            d.pass,
            d.score
        ),
        None => println!("decision: no match (a new entity would be created)"),
    }
    Ok(())
}

fn short_name(pass: &str) -> &str {
    match pass {
        "token_overlap" => "token",
        "edit_distance" => "edit",
        other => other,
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max - 1).collect();
        out.push('…');
        out
    }
}
