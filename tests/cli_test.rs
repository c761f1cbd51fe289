mod common;

use anyhow::Result;
use common::{TestEnvironment, ffmpeg_available, probe_duration};

/// One frame of the 25 fps test clip, plus container timestamp rounding.
const FRAME_TOLERANCE: f64 = 1.0 / 25.0 + 0.005;

#[test]
fn malformed_buflist_fails_before_anything_runs() -> Result<()> {
    let env = TestEnvironment::new()?;

    let output = env.run_bufferer(&["-i", "in.mkv", "-o", "out.mkv", "-b", "[[0,2]"])?;

    assert_eq!(output.exit_code, 1);
    assert!(
        output.stderr.contains("not properly formatted"),
        "unexpected stderr: {}",
        output.stderr
    );
    assert!(env.entries()?.is_empty());
    Ok(())
}

#[test]
fn out_of_order_events_are_rejected() -> Result<()> {
    let env = TestEnvironment::new()?;

    let output = env.run_bufferer(&["-i", "in.mkv", "-o", "out.mkv", "-b", "[[5,1],[2,1]]"])?;

    assert_eq!(output.exit_code, 1);
    assert!(output.stderr.contains("chronological order"));
    Ok(())
}

#[test]
fn missing_input_is_reported() -> Result<()> {
    let env = TestEnvironment::new()?;

    let output = env.run_bufferer(&["-i", "nope.mkv", "-o", "out.mkv", "-b", "0,1"])?;

    assert_eq!(output.exit_code, 1);
    assert!(output.stderr.contains("does not exist"));
    assert!(env.entries()?.is_empty());
    Ok(())
}

#[test]
fn json_errors_carry_an_event_code() -> Result<()> {
    let env = TestEnvironment::new()?;

    let output = env.run_bufferer(&["-i", "in.mkv", "-o", "out.mkv", "-b", "[]", "--json"])?;

    assert_eq!(output.exit_code, 1);
    let line = output.stderr.lines().last().unwrap_or_default();
    let event: serde_json::Value = serde_json::from_str(line)?;
    assert_eq!(event["level"], "error");
    assert_eq!(event["code"], "bufferer.error");
    Ok(())
}

#[test]
fn dry_run_prints_every_pass_and_writes_nothing() -> Result<()> {
    if !ffmpeg_available() {
        eprintln!("skipping: ffmpeg not available");
        return Ok(());
    }
    let env = TestEnvironment::new()?;
    env.make_clip("in.mkv")?;

    let output = env.run_bufferer(&[
        "-i", "in.mkv", "-o", "out.mkv", "-b", "[[0.5, 1]]", "-e", "--dry-run",
    ])?;

    assert_eq!(output.exit_code, 0, "stderr: {}", output.stderr);
    let commands: Vec<_> = output.stdout.lines().collect();
    assert_eq!(commands.len(), 3);
    assert!(commands.iter().all(|line| line.starts_with("ffmpeg ")));
    assert!(commands[0].contains("out.mkv_video.nut"));
    assert!(commands[1].contains("out.mkv_audio.nut"));
    assert!(commands[2].ends_with(" out.mkv"));
    assert_eq!(env.entries()?, vec!["in.mkv"]);
    Ok(())
}

#[test]
fn stalled_output_is_longer_and_temp_files_are_gone() -> Result<()> {
    if !ffmpeg_available() {
        eprintln!("skipping: ffmpeg not available");
        return Ok(());
    }
    let env = TestEnvironment::new()?;
    env.make_clip("in.mkv")?;

    let output = env.run_bufferer(&[
        "-i", "in.mkv", "-o", "out.mkv", "-b", "[[0.5, 1]]", "-e",
    ])?;

    assert_eq!(output.exit_code, 0, "stderr: {}", output.stderr);
    assert_eq!(env.entries()?, vec!["in.mkv", "out.mkv"]);

    let input = probe_duration(&env.file("in.mkv"))?;
    let stalled = probe_duration(&env.file("out.mkv"))?;
    assert!(
        (stalled - (input + 1.0)).abs() <= FRAME_TOLERANCE,
        "input {input}s, stalled {stalled}s"
    );
    Ok(())
}

#[test]
fn spinner_and_skipping_runs_clean_up() -> Result<()> {
    if !ffmpeg_available() {
        eprintln!("skipping: ffmpeg not available");
        return Ok(());
    }
    let env = TestEnvironment::new()?;
    env.make_clip("in.mkv")?;
    let spinner = std::process::Command::new("ffmpeg")
        .args([
            "-nostdin",
            "-y",
            "-f",
            "lavfi",
            "-i",
            "color=c=white:s=32x32",
            "-frames:v",
            "1",
            "spinner.png",
        ])
        .current_dir(env.path())
        .output()?;
    assert!(spinner.status.success());

    let output = env.run_bufferer(&[
        "-i", "in.mkv", "-o", "spun.mkv", "-b", "[[0, 0.5]]", "-s", "spinner.png", "-c",
    ])?;
    assert_eq!(output.exit_code, 0, "stderr: {}", output.stderr);

    let output = env.run_bufferer(&[
        "-i", "in.mkv", "-o", "skipped.mkv", "-b", "[[0.5, 0.5]]", "--skipping",
    ])?;
    assert_eq!(output.exit_code, 0, "stderr: {}", output.stderr);

    let input = probe_duration(&env.file("in.mkv"))?;
    let spun = probe_duration(&env.file("spun.mkv"))?;
    assert!(
        (spun - (input + 0.5)).abs() <= FRAME_TOLERANCE,
        "input {input}s, spun {spun}s"
    );
    let skipped = probe_duration(&env.file("skipped.mkv"))?;
    assert!(
        (skipped - input).abs() <= FRAME_TOLERANCE,
        "input {input}s, skipped {skipped}s"
    );

    assert_eq!(
        env.entries()?,
        vec!["in.mkv", "skipped.mkv", "spinner.png", "spun.mkv"]
    );
    Ok(())
}

#[test]
fn existing_output_needs_force() -> Result<()> {
    if !ffmpeg_available() {
        eprintln!("skipping: ffmpeg not available");
        return Ok(());
    }
    let env = TestEnvironment::new()?;
    env.make_clip("in.mkv")?;
    std::fs::write(env.file("out.mkv"), b"keep me")?;

    let output = env.run_bufferer(&["-i", "in.mkv", "-o", "out.mkv", "-b", "0,1", "-e"])?;
    assert_eq!(output.exit_code, 1);
    assert!(output.stderr.contains("--force"));
    assert_eq!(std::fs::read(env.file("out.mkv"))?, b"keep me");
    Ok(())
}
