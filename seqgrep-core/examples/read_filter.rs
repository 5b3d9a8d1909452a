//! seqgrep Matcher Demo
//!
//! Filters a small batch of synthetic reads through each matcher family
//! and prints the hits as JSON lines, the way an archive filter would.

use anyhow::Result;
use seqgrep_core::{
    count_matches, scan_buffers, ApproxAlgorithm, ExactAlgorithm, MatcherFactory, MatcherParams,
};

fn main() -> Result<()> {
    env_logger::init();

    println!("seqgrep Matcher Demo");
    println!("====================\n");

    let reads: Vec<&[u8]> = vec![
        b"TTACGTTTTTTTTTTT",         // exact hit
        b"TTACCTTTTTTTTTTT",         // one substitution away
        b"TTTTTTAGGTTTTTTT",         // wildcard expression hit
        b"TTTTACGTGGGGACGTTTTT",     // gapped alignment hit
        b"CCCCCCCCCCCCCCCC",         // no hits anywhere
    ];

    demo("exact Boyer-Moore", MatcherParams::exact("ACGT", ExactAlgorithm::BoyerMoore), &reads)?;
    demo(
        "approximate DP @75%",
        MatcherParams::approximate("ACGT", ApproxAlgorithm::Dp, 75),
        &reads,
    )?;
    demo("expression A.G", MatcherParams::expression("A.G", true), &reads)?;
    demo("alignment @50%", MatcherParams::alignment("ACGTACGT", 50), &reads)?;

    // Boolean-mode expressions answer existence only; the counting path is
    // the one that stays available.
    let boolean = MatcherParams::expression("ACGT || A.G", false);
    let matching = count_matches(&boolean, &reads)?;
    println!("boolean expression: {} of {} reads match", matching, reads.len());

    Ok(())
}

fn demo(label: &str, params: MatcherParams, reads: &[&[u8]]) -> Result<()> {
    println!("{} ({:?})", label, MatcherFactory::create(&params)?.name());

    let hits = scan_buffers(&params, reads)?;
    for (read, hit) in reads.iter().zip(&hits) {
        match hit {
            Some(hit) => println!(
                "  {} -> {}",
                std::str::from_utf8(read)?,
                serde_json::to_string(hit)?
            ),
            None => println!("  {} -> no match", std::str::from_utf8(read)?),
        }
    }
    println!();
    Ok(())
}
