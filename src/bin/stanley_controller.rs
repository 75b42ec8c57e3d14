//
// Sinusoid tracking with the Stanley steering law and station-based speed control.
//
use std::path::Path;

use trolley_sim::config::SimConfig;
use trolley_sim::path::SinusoidGenerator;
use trolley_sim::path_tracking::ControllerType;
use trolley_sim::simulation::Simulation;
use trolley_sim::utils::{colors, init_logger, PathStyle, PointStyle, Visualizer};
use trolley_sim::SimResult;

use log::{info, LevelFilter};

fn main() -> SimResult<()> {
    init_logger(LevelFilter::Info, None)?;

    let params = Path::new("params/sim.toml");
    let mut config = if params.exists() {
        SimConfig::load(params)?
    } else {
        SimConfig::default()
    };
    config.control.controller = ControllerType::Stanley;

    let mut sim = Simulation::from_config(&config)?;
    let mut generator = SinusoidGenerator::new(config.generator)?;
    let ticks = sim.run(&mut generator, config.dt, config.duration_s)?;

    let mut vis = Visualizer::new();
    vis.set_title("Stanley")
        .set_aspect_ratio(None)
        .plot_poses(sim.path().samples(), &PathStyle::new(colors::PATH, "Spline path"))
        .plot_points(
            &generator.update(sim.time_s()),
            &PointStyle::new(colors::WAYPOINT, "Waypoints").with_symbol('x'),
        )
        .plot_trajectory(&ticks, &PathStyle::new(colors::TRAJECTORY, "Vehicle").with_line_width(1.0))
        .plot_vehicle(&sim.vehicle().pose(), 1.0);

    std::fs::create_dir_all("img")?;
    vis.save_png("img/stanley_controller.png", 1200, 600)?;
    info!("saved img/stanley_controller.png");
    Ok(())
}
