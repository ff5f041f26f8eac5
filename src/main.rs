use std::{path::PathBuf, time::Duration};

use anyhow::{anyhow, bail, Context, Result};
use log::{info, warn};
use tokio::{sync::broadcast, time};

use keepsake_lib::{
    templates::{memory_cloud, sealed_letter},
    Effect, Experience, ExperienceContent, ExperienceEvent, GestureSample, StageId, TemplateKind,
    TriggerKind, Tuning,
};

const STAGE_TIMEOUT: Duration = Duration::from_secs(30);

/// Headless walk-through of one template: `keepsake-demo <slug> [content.json]`.
#[tokio::main]
async fn main() -> Result<()> {
    keepsake_lib::init_logging();

    let mut args = std::env::args().skip(1);
    let slug = args.next().unwrap_or_else(|| "memory-cloud".to_string());
    let kind = TemplateKind::from_slug(&slug).ok_or_else(|| {
        let known: Vec<_> = TemplateKind::ALL.iter().map(|k| k.slug()).collect();
        anyhow!("unknown template '{slug}' (known: {})", known.join(", "))
    })?;

    let content = match args.next() {
        Some(path) => ExperienceContent::load(&PathBuf::from(path))?,
        None => ExperienceContent::default(),
    };
    let tuning = Tuning::from_env();

    info!("{} - {}", kind.title(), kind.tagline().unwrap_or(""));
    let experience = kind.mount(content, &tuning)?;
    let events = experience.subscribe();
    let printer = tokio::spawn(print_events(experience.subscribe()));

    match kind {
        TemplateKind::MemoryCloud => walk_memory_cloud(&experience, events).await?,
        TemplateKind::SealedLetter => walk_sealed_letter(&experience, events).await?,
        other => bail!("template '{}' has no walk-through", other.slug()),
    }

    let snapshot = experience.snapshot();
    println!("{}", serde_json::to_string_pretty(&snapshot)?);

    experience.unmount();
    drop(experience);
    let _ = printer.await;
    Ok(())
}

async fn print_events(mut events: broadcast::Receiver<ExperienceEvent>) {
    loop {
        match events.recv().await {
            Ok(event) => match serde_json::to_string(&event) {
                Ok(line) => info!("event {line}"),
                Err(err) => warn!("failed to serialize event: {err}"),
            },
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!("event printer skipped {skipped} events")
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

async fn wait_for_stage(
    experience: &Experience,
    events: &mut broadcast::Receiver<ExperienceEvent>,
    stage: usize,
) -> Result<()> {
    let target = StageId(stage);
    time::timeout(STAGE_TIMEOUT, async {
        while experience.current_stage() < target {
            match events.recv().await {
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
    .await
    .with_context(|| format!("timed out waiting for {target}"))?;

    if experience.current_stage() < target {
        bail!("session closed before reaching {target}");
    }
    Ok(())
}

async fn walk_memory_cloud(
    experience: &Experience,
    mut events: broadcast::Receiver<ExperienceEvent>,
) -> Result<()> {
    experience.request_transition(TriggerKind::Click);
    let photos = experience
        .content()
        .photos_for(memory_cloud::FOG_PHOTOS);
    info!("fog hides {} photos: {}", photos.len(), photos.join(", "));

    // Spiral across the fog until it clears.
    let mut step = 0.0_f64;
    while !experience.on_sample(GestureSample::new(
        200.0 + step.cos() * step * 4.0,
        200.0 + step.sin() * step * 4.0,
    )) {
        step += 0.25;
        if step > 1_000.0 {
            bail!("fog never cleared");
        }
    }
    experience.request_transition(TriggerKind::Click);

    for bubble in [0, 2, 4, 6, 1] {
        experience.mark_complete(bubble);
    }
    wait_for_stage(experience, &mut events, memory_cloud::QUESTION).await?;

    experience.request_transition(TriggerKind::Confirm);
    experience.request_transition(TriggerKind::Confirm);
    info!(
        "confetti fired {} times",
        experience.fired_count(Effect::Confetti)
    );
    Ok(())
}

async fn walk_sealed_letter(
    experience: &Experience,
    mut events: broadcast::Receiver<ExperienceEvent>,
) -> Result<()> {
    experience.request_transition(TriggerKind::Click);
    experience.request_transition(TriggerKind::Click);

    for target in [
        sealed_letter::SEAL,
        sealed_letter::TOP_FLAP,
        sealed_letter::BOTTOM_FLAP,
    ] {
        experience.mark_complete(target);
    }
    wait_for_stage(experience, &mut events, sealed_letter::LETTER).await?;

    time::timeout(STAGE_TIMEOUT, async {
        while !experience.is_complete() {
            if let Err(broadcast::error::RecvError::Closed) = events.recv().await {
                break;
            }
        }
    })
    .await
    .context("timed out waiting for the letter")?;
    println!("{}", experience.current_text());

    experience.request_transition(TriggerKind::Confirm);
    wait_for_stage(experience, &mut events, sealed_letter::SIGNED).await
}
