//! Playback demo
//!
//! Builds a small procedural skeleton with a looping walk clip and a queued
//! wave overlay, then steps playback and reports root motion.
//!
//! Usage:
//!     marionette-demo [OPTIONS]
//!
//! Options:
//!     -c, --config <PATH>     Character config JSON (default: built-in)
//!     -t, --ticks <N>         Number of updates to run (default: 240)
//!     --relative              Accumulate relative root motion
//!     --save-clip <PATH>      Write the generated walk clip as JSON
//!     -h, --help              Show this help message

use std::env;
use std::f32::consts::TAU;
use std::path::PathBuf;
use std::sync::Arc;

use glam::{Quat, Vec3};

use marionette::animation::{AnimatedCharacter, Bone, CharacterConfig, MotionClip, Pose, SkeletonBuilder};
use marionette::core::logging;

fn print_help() {
    eprintln!("marionette-demo - Skeletal playback demo");
    eprintln!();
    eprintln!("Usage: marionette-demo [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("    -c, --config <PATH>     Character config JSON (default: built-in)");
    eprintln!("    -t, --ticks <N>         Number of updates to run (default: 240)");
    eprintln!("    --relative              Accumulate relative root motion");
    eprintln!("    --save-clip <PATH>      Write the generated walk clip as JSON");
    eprintln!("    -h, --help              Show this help message");
}

#[derive(Debug)]
struct Args {
    config: Option<PathBuf>,
    ticks: u32,
    relative: bool,
    save_clip: Option<PathBuf>,
}

fn parse_args() -> Result<Args, String> {
    let args: Vec<String> = env::args().skip(1).collect();

    let mut config = None;
    let mut ticks = 240;
    let mut relative = false;
    let mut save_clip = None;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-c" | "--config" => {
                i += 1;
                let path = args.get(i).ok_or("Missing value for --config")?;
                config = Some(PathBuf::from(path));
            }
            "-t" | "--ticks" => {
                i += 1;
                let value = args.get(i).ok_or("Missing value for --ticks")?;
                ticks = value.parse().map_err(|_| format!("Invalid ticks: {}", value))?;
            }
            "--relative" => relative = true,
            "--save-clip" => {
                i += 1;
                let path = args.get(i).ok_or("Missing value for --save-clip")?;
                save_clip = Some(PathBuf::from(path));
            }
            other => return Err(format!("Unknown option: {}", other)),
        }
        i += 1;
    }

    Ok(Args {
        config,
        ticks,
        relative,
        save_clip,
    })
}

fn build_skeleton() -> marionette::Result<marionette::Skeleton> {
    SkeletonBuilder::new()
        .add_root(Bone::new("lowerback", Vec3::Y, 0.2).with_dofs([true, true, true]))
        .add_bone(Bone::new("upperback", Vec3::Y, 0.25), "lowerback")
        .add_bone(Bone::new("head", Vec3::Y, 0.2), "upperback")
        .add_bone(Bone::with_axis("lhumerus", Vec3::X, 0.3, Vec3::new(0.0, 0.0, -90.0)), "upperback")
        .add_bone(Bone::with_axis("rhumerus", Vec3::NEG_X, 0.3, Vec3::new(0.0, 0.0, 90.0)), "upperback")
        .add_bone(Bone::new("lfemur", Vec3::NEG_Y, 0.45).with_dofs([true, true, true]), "lowerback")
        .add_bone(Bone::new("ltibia", Vec3::NEG_Y, 0.45).with_dofs([true, false, false]), "lfemur")
        .add_bone(Bone::new("rfemur", Vec3::NEG_Y, 0.45).with_dofs([true, true, true]), "lowerback")
        .add_bone(Bone::new("rtibia", Vec3::NEG_Y, 0.45).with_dofs([true, false, false]), "rfemur")
        .build()
}

fn walk_clip(frame_count: usize) -> marionette::Result<MotionClip> {
    let frames = (0..frame_count)
        .map(|i| {
            let phase = i as f32 / frame_count as f32 * TAU;
            let swing = phase.sin() * 0.5;
            Pose::identity()
                .with_joint("lfemur", Quat::from_rotation_x(swing))
                .with_joint("rfemur", Quat::from_rotation_x(-swing))
                .with_joint("ltibia", Quat::from_rotation_x(swing.max(0.0)))
                .with_joint("rtibia", Quat::from_rotation_x((-swing).max(0.0)))
                .with_root_position(Vec3::new(0.0, 0.9, i as f32 * 0.02))
        })
        .collect();
    MotionClip::new("walk", frames)
}

fn wave_clip(frame_count: usize) -> marionette::Result<MotionClip> {
    let frames = (0..frame_count)
        .map(|i| {
            let phase = i as f32 / frame_count as f32 * TAU * 3.0;
            Pose::identity()
                .with_joint("rhumerus", Quat::from_rotation_z(1.2 + phase.sin() * 0.4))
                .with_root_position(Vec3::new(0.0, 0.9, 0.0))
        })
        .collect();
    MotionClip::new("wave", frames)
}

fn run(args: Args) -> marionette::Result<()> {
    let mut config = match &args.config {
        Some(path) => CharacterConfig::load(path)?,
        None => CharacterConfig::default(),
    };
    if args.relative {
        config.use_absolute_position = false;
    }

    let walk = Arc::new(walk_clip(120)?);
    let wave = Arc::new(wave_clip(90)?);

    if let Some(path) = &args.save_clip {
        walk.save_sync(path)?;
        log::info!("Wrote walk clip to {}", path.display());
    }

    let mut character = AnimatedCharacter::from_config(build_skeleton()?, &config)?;
    character.play(walk);
    character.overlay(wave, 10);

    let delta_time = 1.0 / config.fps;
    for tick in 0..args.ticks {
        character.update(delta_time);

        if tick % 30 == 0 {
            if let Some(sample) = character.last_sample() {
                log::info!(
                    "tick {:4}: base frame {:3}, overlay {:?}, weight {:.2}, root {:?}",
                    tick,
                    sample.base_frame,
                    sample.overlay_frame,
                    sample.blend_weight,
                    character.root_world_position()
                );
            }
        }
    }

    let segments = character.skeleton().bone_segments(glam::Mat4::from_translation(character.position()));
    for (index, (start, end)) in segments.iter().enumerate() {
        if let Some(bone) = character.skeleton().get_bone(index) {
            log::debug!("{:>10}: {:?} -> {:?}", bone.name, start, end);
        }
    }

    log::info!(
        "Finished {} ticks, {} overlays still queued",
        args.ticks,
        character.queue_count()
    );
    Ok(())
}

fn main() {
    logging::init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!();
            print_help();
            std::process::exit(1);
        }
    };

    if let Err(e) = run(args) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
