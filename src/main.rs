// src/main.rs
use anyhow::{bail, Context};
use cytometer_signal::acquisition::{
    load_config, save_config, AcquisitionConfig, AcquisitionPipeline, ManualParticleSource,
    PulseTrain,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
// 演示用粒子：到达时间均匀随机，宽度与耦合功率有小幅抖动
fn demo_source(config: &AcquisitionConfig, particles: usize) -> anyhow::Result<ManualParticleSource> {
    let mut rng = StdRng::seed_from_u64(config.seed.unwrap_or(0));
    let margin = 0.05 * config.run_time_s;
    let mut centers: Vec<f64> = (0..particles)
        .map(|_| rng.gen_range(margin..config.run_time_s - margin))
        .collect();
    centers.sort_by(f64::total_cmp);
    let widths = (0..particles)
        .map(|_| rng.gen_range(2.0..4.0) / config.sampling_rate_hz)
        .collect();
    let amplitudes = (0..particles).map(|_| rng.gen_range(0.5..1.5)).collect();
    let fsc = PulseTrain::new(widths, centers, amplitudes)?;
    let mut ssc = fsc.clone();
    ssc.amplitudes.iter_mut().for_each(|a| *a *= 0.4);
    Ok(ManualParticleSource::new(fsc).with_channel("SSC", ssc))
}
fn usage() -> &'static str {
    "usage: cytometer-signal [CONFIG.json] | --write-config PATH"
}
// 入口函数
fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = match args.as_slice() {
        [] => AcquisitionConfig::default(),
        [flag, path] if flag == "--write-config" => {
            save_config(&AcquisitionConfig::default(), path)
                .with_context(|| format!("writing {path}"))?;
            log::info!("default configuration written to {path}");
            return Ok(());
        }
        [path] if !path.starts_with("--") => {
            load_config(path).with_context(|| format!("loading configuration from {path}"))?
        }
        _ => bail!(usage()),
    };
    let source = demo_source(&config, 12)?;
    let mut pipeline = AcquisitionPipeline::new(config, source)?;
    let run = pipeline.run().context("acquisition run failed")?;
    println!(
        "{} samples, {} events on '{}'",
        run.store.n_elements(),
        run.event_count(),
        pipeline.config().triggering.channel
    );
    for (channel, tables) in &run.peaks {
        let heights: Vec<String> = tables
            .iter()
            .filter_map(|table| table.records().first())
            .map(|peak| format!("{:.3}", peak.height))
            .collect();
        println!("{channel}: [{}]", heights.join(", "));
    }
    if let Some(reports) = &run.digitizer_reports {
        for (channel, report) in reports {
            if report.is_saturated {
                log::warn!("{channel} saturated between {} and {}", report.min, report.max);
            }
        }
    }
    Ok(())
}
