use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tin_bus::constants::{TIN_FRAME_INFO, TIN_INFO_FRAME_LEN};
use tin_bus::tinbus::codec::{decode_status, ELECTRO_POWER_OPTIONS, VENT_SPEED_OPTIONS};
use tin_bus::tinbus::frame::decode_protected_id;
use tin_bus::{
    decode_capture, init_logger, log_error, log_info, open_channel, BusBridge, BusComponent,
    Command, DeviceController, DeviceSinks, FuelMode, LogSink, SystemClock, TinBusConfig,
};

#[derive(Parser)]
#[command(name = "tinbus-cli")]
#[command(about = "CLI tool for TIN bus heaters")]
struct Cli {
    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a device controller and log status updates
    Device {
        #[arg(short, long)]
        port: String,
    },
    SetAirTemp {
        #[arg(short, long)]
        port: String,
        celsius: f32,
    },
    SetWaterTemp {
        #[arg(short, long)]
        port: String,
        celsius: f32,
    },
    SetFuelMode {
        #[arg(short, long)]
        port: String,
        #[arg(long)]
        gas: bool,
        #[arg(long)]
        electro: bool,
    },
    SetElectroPower {
        #[arg(short, long)]
        port: String,
        level: u8,
    },
    SetVentSpeed {
        #[arg(short, long)]
        port: String,
        speed: u8,
    },
    /// Request one status frame and log the reply
    RequestStatus {
        #[arg(short, long)]
        port: String,
    },
    /// Forward traffic between a control panel and a heater
    Bridge {
        #[arg(long)]
        panel_port: String,
        #[arg(long)]
        heater_port: String,
    },
    /// Decode a captured frame given as hex
    Decode { hex: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logger();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => TinBusConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => TinBusConfig::default(),
    };

    match cli.command {
        Commands::Device { port } => {
            let mut device = device_controller(&port, &config)?;
            run(&mut device, config.tick_interval_ms).await;
        }
        Commands::SetAirTemp { port, celsius } => {
            one_shot(&port, &config, Command::SetAirTemperature(celsius))?;
        }
        Commands::SetWaterTemp { port, celsius } => {
            one_shot(&port, &config, Command::SetWaterTemperature(celsius))?;
        }
        Commands::SetFuelMode { port, gas, electro } => {
            let mut mode = FuelMode::empty();
            mode.set(FuelMode::GAS, gas);
            mode.set(FuelMode::ELECTRO, electro);
            one_shot(&port, &config, Command::SetFuelMode(mode))?;
        }
        Commands::SetElectroPower { port, level } => {
            one_shot(&port, &config, Command::SetElectroPower(level))?;
        }
        Commands::SetVentSpeed { port, speed } => {
            one_shot(&port, &config, Command::SetVentSpeed(speed))?;
        }
        Commands::RequestStatus { port } => {
            let mut device = device_controller(&port, &config)?;
            device.setup();
            device.request_status()?;
            // give the heater a few idle periods to answer
            let wait = Duration::from_millis(config.device.idle_timeout_ms * 5);
            let mut interval =
                tokio::time::interval(Duration::from_millis(config.tick_interval_ms));
            let deadline = tokio::time::Instant::now() + wait;
            while tokio::time::Instant::now() < deadline {
                interval.tick().await;
                device.process_input();
            }
        }
        Commands::Bridge {
            panel_port,
            heater_port,
        } => {
            let panel = open_channel(&panel_port, &config)
                .with_context(|| format!("opening panel port {panel_port}"))?;
            let heater = open_channel(&heater_port, &config)
                .with_context(|| format!("opening heater port {heater_port}"))?;
            let mut bridge = BusBridge::new(panel, heater, SystemClock::new(), config.bridge.clone())
                .with_text_sink(Box::new(LogSink::new("TIN bus")));
            run(&mut bridge, config.tick_interval_ms).await;
        }
        Commands::Decode { hex } => {
            let diagnostics = decode_capture(&hex)?;
            println!("{diagnostics}");

            let bytes = tin_bus::util::hex::decode_hex(&hex)?;
            if bytes.len() >= TIN_INFO_FRAME_LEN && decode_protected_id(bytes[1]) == TIN_FRAME_INFO {
                let status = decode_status(&bytes)?;
                println!("{}", serde_json::to_string_pretty(&status)?);
            }
        }
    }

    Ok(())
}

fn device_controller(
    port: &str,
    config: &TinBusConfig,
) -> anyhow::Result<DeviceController<tin_bus::SerialChannel, SystemClock>> {
    let channel = open_channel(port, config).with_context(|| format!("opening {port}"))?;
    let sinks = DeviceSinks {
        air_temperature: Some(Box::new(LogSink::new("Air temperature"))),
        water_temperature: Some(Box::new(LogSink::new("Water temperature"))),
        status: Some(Box::new(LogSink::new("Status"))),
        power: Some(Box::new(LogSink::new("Power"))),
        fuel_gas: Some(Box::new(LogSink::new("Fuel gas"))),
        fuel_electro: Some(Box::new(LogSink::new("Fuel electro"))),
        vent_speed: Some(Box::new(
            LogSink::new("Vent speed").with_options(&VENT_SPEED_OPTIONS),
        )),
        electro_power: Some(Box::new(
            LogSink::new("Electro power").with_options(&ELECTRO_POWER_OPTIONS),
        )),
    };
    Ok(DeviceController::new(channel, SystemClock::new(), config.device.clone()).with_sinks(sinks))
}

fn one_shot(port: &str, config: &TinBusConfig, command: Command) -> anyhow::Result<()> {
    let mut device = device_controller(port, config)?;
    if !device.send_command(command)? {
        bail!("{command:?} rejected, nothing sent");
    }
    log_info("Command sent");
    Ok(())
}

async fn run<T: BusComponent>(component: &mut T, tick_interval_ms: u64) {
    component.setup();
    component.dump_config();

    let mut interval = tokio::time::interval(Duration::from_millis(tick_interval_ms));
    loop {
        tokio::select! {
            _ = interval.tick() => {
                if let Err(e) = component.tick() {
                    log_error(&format!("Tick failed: {e}"));
                }
            }
            _ = tokio::signal::ctrl_c() => {
                log_info("Shutting down");
                break;
            }
        }
    }
    component.dump_config();
}
