//! # Label Agent CLI
//!
//! ```bash
//! # Run the HTTP print agent on port 9000
//! label-agent serve
//!
//! # Print a file once, without the server
//! label-agent print logo.png
//!
//! # Inspect the command stream without a printer attached
//! label-agent encode logo.png -o logo.bin --png preview.png
//! ```

use clap::{Args, Parser, Subcommand};
use log::info;
use std::{fs, path::PathBuf, sync::Arc, time::Duration};

use label_agent::{
    preview,
    server::{self, ServerConfig, DEFAULT_LISTEN_ADDR},
    Config, Error, Geometry, Printer, PrinterId, Rasterizer, Transport, DEFAULT_THRESHOLD,
};

/// Label agent - print images on a USB thermal label printer
#[derive(Parser, Debug)]
#[command(name = "label-agent")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Accept images on POST /print and print them
    Serve {
        /// Address to listen on
        #[arg(long, default_value = DEFAULT_LISTEN_ADDR)]
        listen: String,

        #[command(flatten)]
        device: DeviceArgs,

        #[command(flatten)]
        raster: RasterArgs,
    },
    /// Print an image file once
    Print {
        /// Image to print
        file: PathBuf,

        #[command(flatten)]
        device: DeviceArgs,

        #[command(flatten)]
        raster: RasterArgs,
    },
    /// Write the raster command stream for an image without printing
    Encode {
        /// Image to encode
        file: PathBuf,

        /// Where to write the command bytes
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Also render the raster as a PNG preview
        #[arg(long, value_name = "FILE")]
        png: Option<PathBuf>,

        #[command(flatten)]
        raster: RasterArgs,
    },
}

#[derive(Args, Debug)]
struct DeviceArgs {
    /// USB vendor and product id of the printer, in hex
    #[arg(long, default_value_t = PrinterId::DEFAULT)]
    printer: PrinterId,

    /// Timeout for each USB write, in milliseconds
    #[arg(long, default_value_t = 10_000)]
    timeout_ms: u64,
}

impl DeviceArgs {
    fn printer(&self) -> Printer {
        let config =
            Config::new(self.printer).write_timeout(Duration::from_millis(self.timeout_ms));
        Printer::new(config)
    }
}

#[derive(Args, Debug)]
struct RasterArgs {
    /// Printable width in dots
    #[arg(
        long,
        default_value_t = Geometry::LABEL_48X24.width,
        value_parser = clap::value_parser!(u32).range(..=i64::from(Geometry::MAX_WIDTH))
    )]
    width: u32,

    /// Printable height in dots
    #[arg(
        long,
        default_value_t = Geometry::LABEL_48X24.height,
        value_parser = clap::value_parser!(u32).range(..=i64::from(Geometry::MAX_HEIGHT))
    )]
    height: u32,

    /// Gray values below this print black (0-255)
    #[arg(long, default_value_t = DEFAULT_THRESHOLD)]
    threshold: u8,
}

impl RasterArgs {
    fn rasterizer(&self) -> Rasterizer {
        Rasterizer::new(Geometry::new(self.width, self.height)).threshold(self.threshold)
    }
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Error> {
    match cli.command {
        Commands::Serve {
            listen,
            device,
            raster,
        } => {
            let config = ServerConfig {
                listen_addr: listen,
                rasterizer: raster.rasterizer(),
            };
            info!("printing to {}", device.printer);
            server::serve(config, Arc::new(device.printer())).await
        }
        Commands::Print {
            file,
            device,
            raster,
        } => {
            let image = image::open(&file)?;
            let buf = raster.rasterizer().rasterize(&image);
            info!("printing {} ({} bytes)", file.display(), buf.len());

            let printer = device.printer();
            tokio::task::spawn_blocking(move || printer.transmit(&buf))
                .await
                .map_err(|e| Error::IoError(std::io::Error::new(std::io::ErrorKind::Other, e)))?
        }
        Commands::Encode {
            file,
            output,
            png,
            raster,
        } => {
            let image = image::open(&file)?;
            let buf = raster.rasterizer().rasterize(&image);

            match output {
                Some(path) => {
                    fs::write(&path, &buf)?;
                    info!("wrote {} bytes to {}", buf.len(), path.display());
                }
                None => println!("{} bytes", buf.len()),
            }

            if let Some(path) = png {
                preview::render(&buf)?.save(&path)?;
                info!("wrote preview to {}", path.display());
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_args(extra: &[&str]) -> Result<Cli, clap::Error> {
        let mut args = vec!["label-agent", "encode", "logo.png"];
        args.extend_from_slice(extra);
        Cli::try_parse_from(args)
    }

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn geometry_defaults_to_label() {
        let Commands::Encode { raster, .. } = encode_args(&[]).unwrap().command else {
            panic!("expected encode");
        };
        assert_eq!(raster.rasterizer().geometry(), Geometry::LABEL_48X24);
        assert_eq!(raster.threshold, DEFAULT_THRESHOLD);
    }

    #[test]
    fn geometry_is_bounded_by_header_fields() {
        assert!(encode_args(&["--width", "524155", "--height", "65535"]).is_ok());
        assert!(encode_args(&["--width", "524156"]).is_err());
        assert!(encode_args(&["--height", "65536"]).is_err());
        assert!(encode_args(&["--width", "4294967295"]).is_err());
    }

    #[test]
    fn printer_id_is_parsed_from_hex() {
        let cli = Cli::try_parse_from(["label-agent", "print", "logo.png", "--printer", "04f9:209b"])
            .unwrap();
        let Commands::Print { device, .. } = cli.command else {
            panic!("expected print");
        };
        assert_eq!(device.printer().id(), PrinterId::new(0x04F9, 0x209B));
    }
}
