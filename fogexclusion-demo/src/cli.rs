use anyhow::{Context, Result};
use fogexclusion_core::config::ExclusionManagerDesc;
use fogexclusion_core::manager::ExclusionManager;
use fogexclusion_core::math::{Quat, Transform, Vec3};
use fogexclusion_core::scene::{ExclusionScene, VolumeId};
use fogexclusion_core::sink::UniformStore;
use fogexclusion_core::uniforms::ExclusionUniforms;
use fogexclusion_core::volume::ExclusionVolume;
use std::time::Duration;

const FRAME: Duration = Duration::from_millis(100);

pub fn run_cli_scenarios() -> Result<()> {
    log::info!("=== Running On-Demand Scenario ===");
    on_demand_scenario()?;

    log::info!("\n=== Running Interval Scenario ===");
    interval_scenario()?;

    log::info!("\n=== Running Over-Capacity Scenario ===");
    over_capacity_scenario()?;

    Ok(())
}

fn build_scene(count: usize) -> Result<(ExclusionScene, Vec<VolumeId>)> {
    let mut scene = ExclusionScene::new();
    let mut ids = Vec::with_capacity(count);
    for i in 0..count {
        let angle = i as f32 * 0.4;
        let volume = ExclusionVolume::new(
            Transform::from_translation_scale(
                Vec3::new(i as f32 * 4.0 - 8.0, 1.0, 0.0),
                Vec3::new(2.0, 2.0, 3.0),
            )
            .with_rotation(Quat::from_rotation_y(angle)),
        );
        ids.push(scene.add_volume(volume)?);
    }
    Ok((scene, ids))
}

fn report_point(uniforms: &ExclusionUniforms, label: &str, point: Vec3) {
    match uniforms.containing_slot(point) {
        Some(slot) => log::info!("  {} {:?}: excluded by slot {}", label, point, slot),
        None => log::info!("  {} {:?}: fogged", label, point),
    }
}

fn read_back(manager: &ExclusionManager<UniformStore>) -> Result<ExclusionUniforms> {
    ExclusionUniforms::from_store(manager.sink()).context("exclusion uniforms were not published")
}

fn on_demand_scenario() -> Result<()> {
    let (mut scene, ids) = build_scene(3)?;
    let mut manager = ExclusionManager::new(ExclusionManagerDesc::on_demand(), UniformStore::new());
    manager.set_volumes(ids.iter().copied().map(Some));

    let report = manager
        .initialize(&scene, Duration::ZERO)
        .context("initial publish did not run")?;
    log::info!("Initial publish: {:?}", report);

    let probe = Vec3::new(-8.0, 1.0, 0.0);
    report_point(&read_back(&manager)?, "before move", probe);

    scene.set_transform(
        ids[0],
        Transform::from_translation_scale(Vec3::new(-8.0, 20.0, 0.0), Vec3::new(2.0, 2.0, 3.0)),
    )?;
    log::info!("Moved volume {} without publishing", ids[0]);

    let mut now = Duration::ZERO;
    for _ in 0..10 {
        now += FRAME;
        manager.tick(&scene, now);
    }
    log::info!(
        "After 10 ticks: {} publish(es), data is stale",
        manager.publish_count()
    );
    report_point(&read_back(&manager)?, "stale", probe);

    manager.publish(&scene);
    log::info!("Explicit publish: {:?}", manager.last_report());
    report_point(&read_back(&manager)?, "fresh", probe);

    Ok(())
}

fn interval_scenario() -> Result<()> {
    let (mut scene, ids) = build_scene(2)?;
    let mut manager = ExclusionManager::new(
        ExclusionManagerDesc::every_secs(0.5)?,
        UniformStore::new(),
    );
    manager.set_volumes(ids.iter().copied().map(Some));
    manager.initialize(&scene, Duration::ZERO);

    let mut now = Duration::ZERO;
    for frame in 1..=15 {
        now += FRAME;
        let x = -8.0 + frame as f32 * 0.5;
        scene.set_transform(
            ids[0],
            Transform::from_translation_scale(Vec3::new(x, 1.0, 0.0), Vec3::new(2.0, 2.0, 3.0)),
        )?;

        match manager.tick(&scene, now) {
            Some(report) => log::info!(
                "t={:.1}s volume at x={:.1}: published {:?}",
                now.as_secs_f32(),
                x,
                report
            ),
            None => log::debug!("t={:.1}s skipped (interval not elapsed)", now.as_secs_f32()),
        }
    }

    let uniforms = read_back(&manager)?;
    log::info!(
        "Published center of slot 0: {:?}",
        uniforms.positions[0].truncate()
    );
    Ok(())
}

fn over_capacity_scenario() -> Result<()> {
    let (mut scene, ids) = build_scene(12)?;
    let mut manager = ExclusionManager::new(ExclusionManagerDesc::on_demand(), UniformStore::new());

    let mut assigned: Vec<Option<VolumeId>> = ids.iter().copied().map(Some).collect();
    assigned[2] = None;
    manager.set_volumes(assigned);
    scene.remove_volume(ids[5]);

    let report = manager
        .initialize(&scene, Duration::ZERO)
        .context("initial publish did not run")?;
    log::info!("Published {:?}", report);

    let uniforms = read_back(&manager)?;
    log::info!("Shader count: {}", uniforms.count);
    for i in 0..12 {
        let center = Vec3::new(i as f32 * 4.0 - 8.0, 1.0, 0.0);
        report_point(&uniforms, &format!("volume #{}", i), center);
    }

    Ok(())
}
