use crate::infra::{assignment_engine, in_memory_registry};
use clap::Args;
use grimoire_registry::admissions::{
    Affinity, AssignmentEngine, CloverCategory, RequestForm, RequestPatch, RequestStatus,
};
use grimoire_registry::config::AssignmentConfig;
use grimoire_registry::error::AppError;
use std::collections::BTreeMap;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Seed the grimoire draw so the demo output is reproducible.
    #[arg(long)]
    pub(crate) seed: Option<u64>,
    /// Reject the applicant instead of approving them.
    #[arg(long)]
    pub(crate) reject: bool,
}

#[derive(Args, Debug)]
pub(crate) struct DrawArgs {
    /// Number of draws to sample.
    #[arg(long, default_value_t = 10_000)]
    pub(crate) samples: usize,
    /// Seed for a reproducible sample.
    #[arg(long)]
    pub(crate) seed: Option<u64>,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let config = AssignmentConfig {
        rng_seed: args.seed,
    };
    let registry = in_memory_registry(&config);

    println!("Admission request");
    let request = registry.create(demo_form())?;
    println!(
        "  #{} {} {} ({}, {:?}) -> {}",
        request.id,
        request.given_name,
        request.family_name,
        request.age,
        request.affinity,
        request.status
    );

    let request = registry.update(
        request.id,
        RequestPatch {
            age: Some(i64::from(request.age) + 1),
            ..RequestPatch::default()
        },
    )?;
    println!("  Updated age while pending: {}", request.age);

    let target = if args.reject {
        RequestStatus::Rejected
    } else {
        RequestStatus::Approved
    };
    let outcome = registry.transition(request.id, target)?;
    println!("  Status: {}", outcome.request.status);
    match outcome.category {
        Some(category) => println!("  Awarded grimoire: {category}"),
        None => println!("  No grimoire awarded"),
    }

    if let Err(err) = registry.transition(request.id, RequestStatus::Rejected) {
        println!("  Second status change refused: {err}");
    }

    let views = registry.list_assignments()?;
    match serde_json::to_string_pretty(&views) {
        Ok(json) => println!("  Assignment listing:\n{}", json),
        Err(err) => println!("  Assignment listing unavailable: {}", err),
    }

    Ok(())
}

pub(crate) fn run_draw(args: DrawArgs) -> Result<(), AppError> {
    let engine = assignment_engine(&AssignmentConfig {
        rng_seed: args.seed,
    });
    let counts = sample(&engine, args.samples);

    println!("Grimoire draw over {} samples", args.samples);
    println!("  {:<18} {:>9} {:>9}", "category", "expected", "observed");
    for (category, _) in engine.table().entries() {
        let observed = counts.get(category).copied().unwrap_or(0);
        let share = if args.samples == 0 {
            0.0
        } else {
            observed as f64 / args.samples as f64
        };
        println!(
            "  {:<18} {:>8.2}% {:>8.2}%",
            category.label(),
            engine.table().probability_of(*category) * 100.0,
            share * 100.0
        );
    }

    Ok(())
}

fn sample(engine: &AssignmentEngine, samples: usize) -> BTreeMap<CloverCategory, usize> {
    let mut counts = BTreeMap::new();
    for _ in 0..samples {
        *counts.entry(engine.draw().category).or_insert(0) += 1;
    }
    counts
}

fn demo_form() -> RequestForm {
    RequestForm {
        identity: "ID123456".to_string(),
        given_name: "Noelle".to_string(),
        family_name: "Silva".to_string(),
        age: 25,
        affinity: Affinity::Water,
    }
}
