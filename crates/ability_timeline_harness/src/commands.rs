// SPDX-License-Identifier: MIT OR Apache-2.0
//! Subcommand implementations.

use crate::error::{HarnessError, Result};
use crate::scenario;
use ability_timeline_model::{AbilityDb, AbilityId, BakeOutput, ResourceCatalog, Severity};
use ability_timeline_preview::{PreviewClipEvent, PreviewSession, TimelineState};
use clap::Args;
use std::path::{Path, PathBuf};

/// Arguments shared by commands that read an ability document
#[derive(Args, Debug)]
pub struct SourceArgs {
    /// Ability document (.ron, .json or baked .bin)
    pub input: PathBuf,
    /// Resource catalog used to derive clip durations
    #[arg(long)]
    pub catalog: Option<PathBuf>,
}

impl SourceArgs {
    fn load(&self) -> Result<BakeOutput> {
        let catalog = match &self.catalog {
            Some(path) => ResourceCatalog::load(path)?,
            None => ResourceCatalog::default(),
        };
        Ok(AbilityDb::load(&self.input, &catalog)?)
    }
}

/// `validate` arguments
#[derive(Args, Debug)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Treat warnings as errors
    #[arg(long)]
    pub strict: bool,
}

/// `bake` arguments
#[derive(Args, Debug)]
pub struct BakeArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Output path of the baked table
    #[arg(long, short)]
    pub output: PathBuf,
}

/// `simulate` arguments
#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Scenario file
    pub scenario: PathBuf,
}

/// `preview` arguments
#[derive(Args, Debug)]
pub struct PreviewArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Ability id to preview; the first in the table when omitted
    #[arg(long)]
    pub ability: Option<String>,
    /// Frame delta in seconds
    #[arg(long, default_value_t = 1.0 / 60.0)]
    pub dt: f32,
    /// Playback speed
    #[arg(long, default_value_t = 1.0)]
    pub speed: f32,
    /// Loop playback
    #[arg(long = "loop")]
    pub looping: bool,
    /// Frames to run at most
    #[arg(long, default_value_t = 600)]
    pub frames: usize,
}

fn tally(summary: &mut PreviewSummary, events: &[PreviewClipEvent]) {
    for event in events {
        match event {
            PreviewClipEvent::Spawned { .. } => summary.clips_spawned += 1,
            PreviewClipEvent::Despawned { .. } => summary.clips_despawned += 1,
            PreviewClipEvent::Sampled { .. } => {}
        }
    }
}

fn report_issues(baked: &BakeOutput) -> (usize, usize) {
    let mut errors = 0;
    for issue in &baked.issues {
        match issue.severity {
            Severity::Error => {
                errors += 1;
                println!("{issue}");
            }
            Severity::Warning => println!("{issue}"),
        }
    }
    (errors, baked.issues.len() - errors)
}

/// Validate a document and print every issue
pub fn validate(args: &ValidateArgs) -> Result<()> {
    let baked = args.source.load()?;
    let (errors, warnings) = report_issues(&baked);
    println!(
        "{}: {} abilities, {errors} errors, {warnings} warnings",
        args.source.input.display(),
        baked.db.len()
    );
    let failures = if args.strict { errors + warnings } else { errors };
    if failures > 0 {
        return Err(HarnessError::Invalid(failures));
    }
    Ok(())
}

/// Bake a document into a binary table
pub fn bake(args: &BakeArgs) -> Result<()> {
    let baked = args.source.load()?;
    let (errors, warnings) = report_issues(&baked);
    if !is_baked(&args.output) {
        tracing::warn!("{} does not end in .bin; loaders will not detect it as a baked table", args.output.display());
    }
    baked.db.save_baked(&args.output)?;
    tracing::info!(
        "Baked {} abilities to {} ({errors} errors, {warnings} warnings)",
        baked.db.len(),
        args.output.display()
    );
    Ok(())
}

/// Run a scenario and print its summary
pub fn simulate(args: &SimulateArgs) -> Result<()> {
    let summary = scenario::run_file(&args.scenario)?;
    println!(
        "{} ticks: {} casts accepted, {} rejected, {} finished, {} cancelled, {} clips",
        summary.ticks,
        summary.casts_accepted,
        summary.casts_rejected,
        summary.abilities_finished,
        summary.abilities_cancelled,
        summary.clips_spawned
    );
    println!("requests ({}): {}", summary.requests.total(), summary.requests);
    Ok(())
}

/// What a preview run showed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreviewSummary {
    /// Frames sampled
    pub frames: usize,
    /// Phase changes under the playhead
    pub phase_changes: usize,
    /// Distinct frames that showed at least one key
    pub frames_with_keys: usize,
    /// Effect clips spawned
    pub clips_spawned: usize,
    /// Effect clips despawned, including on exit
    pub clips_despawned: usize,
    /// Playhead when the run stopped
    pub playhead: f32,
}

/// Play an ability through a preview session
pub fn run_preview(db: &AbilityDb, ability: Option<&str>, args: &PreviewArgs) -> Result<PreviewSummary> {
    let definition = match ability {
        Some(name) => db.get(AbilityId::from_name(name)),
        None => db.iter().next().map(|(_, a)| a),
    }
    .ok_or_else(|| HarnessError::UnknownAbility(ability.unwrap_or("<empty table>").to_string()))?;
    tracing::info!("Previewing {} ({:.3}s)", definition.id.name(), definition.total_duration());

    let mut session = PreviewSession::new(TimelineState::with_ability(definition.clone()));
    let state = session.state_mut();
    state.set_speed(args.speed);
    state.set_loop(args.looping);
    state.play();

    let mut summary = PreviewSummary::default();
    let mut last_phase = None;
    let first = session.enter_preview()?;
    tally(&mut summary, &first.events);
    while session.state().playback().is_playing() && summary.frames < args.frames {
        let Some(update) = session.update(args.dt) else {
            break;
        };
        summary.frames += 1;
        if update.frame.phase != last_phase {
            tracing::debug!("t={:.3} phase {:?}", update.frame.time, update.frame.phase);
            last_phase = update.frame.phase;
            summary.phase_changes += 1;
        }
        if !update.frame.keys.is_empty() {
            summary.frames_with_keys += 1;
        }
        for event in &update.events {
            if !matches!(event, PreviewClipEvent::Sampled { restart: false, .. }) {
                tracing::debug!("t={:.3} {event:?}", update.frame.time);
            }
        }
        tally(&mut summary, &update.events);
    }
    summary.playhead = session.state().playback().playhead();
    let exit = session.exit_preview();
    tally(&mut summary, &exit);
    Ok(summary)
}

/// Preview an ability and print what was shown
pub fn preview(args: &PreviewArgs) -> Result<()> {
    let baked = args.source.load()?;
    let summary = run_preview(&baked.db, args.ability.as_deref(), args)?;
    println!(
        "{} frames, {} phase changes, {} frames with keys, {} clips spawned, {} despawned, stopped at {:.3}s",
        summary.frames,
        summary.phase_changes,
        summary.frames_with_keys,
        summary.clips_spawned,
        summary.clips_despawned,
        summary.playhead
    );
    Ok(())
}

/// Whether `path` looks like a baked table
pub fn is_baked(path: &Path) -> bool {
    path.extension().is_some_and(|e| e == "bin")
}
