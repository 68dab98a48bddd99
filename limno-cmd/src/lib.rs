//! Command implementations for the limno CLI.
//!
//! Each subcommand retrieves or reads one kind of lake data, writes it as
//! JSON and optionally renders a chart next to it.

use clap::Subcommand;
use limno_nc::mitgcm::CutAxis;
use limno_sources::{
    alplakes::ExportLayout,
    kind::{Datatype, SourceKind},
};
use std::path::PathBuf;

pub mod alplakes;
pub mod animate;
pub mod datalakes;
pub mod delft3d;
pub mod validate;

#[derive(Subcommand)]
pub enum Command {
    /// Download a Delft3D point timeseries from Alplakes
    AlplakesTimeseries {
        /// Lake key, e.g. geneva
        #[arg(long)]
        lake: String,

        #[arg(long, allow_negative_numbers = true)]
        lat: f64,

        #[arg(long, allow_negative_numbers = true)]
        lon: f64,

        /// Start instant (YYYY-MM-DD, YYYY-MM-DDTHH:MM or RFC 3339)
        #[arg(long)]
        start: String,

        /// End instant
        #[arg(long)]
        end: String,

        /// Depth in metres
        #[arg(long, default_value_t = 1.0)]
        depth: f64,

        /// Where the raw JSON response is written
        #[arg(short = 'o', long)]
        output: PathBuf,

        /// Optional PNG chart of the series
        #[arg(long)]
        plot: Option<PathBuf>,
    },

    /// Download a Delft3D vertical profile from Alplakes
    AlplakesProfile {
        #[arg(long)]
        lake: String,

        #[arg(long, allow_negative_numbers = true)]
        lat: f64,

        #[arg(long, allow_negative_numbers = true)]
        lon: f64,

        /// Instant of the profile
        #[arg(long)]
        date: String,

        #[arg(short = 'o', long)]
        output: PathBuf,

        #[arg(long)]
        plot: Option<PathBuf>,
    },

    /// Concatenate a directory of saved Alplakes JSON files along time
    AlplakesDirectory {
        /// Directory holding the *.json files
        #[arg(short = 'd', long)]
        dir: PathBuf,

        /// point, simstrat-surface or simstrat (depth/time)
        #[arg(long, default_value = "point")]
        layout: ExportLayout,

        /// Where the merged array is written as JSON
        #[arg(short = 'o', long)]
        output: PathBuf,

        #[arg(long)]
        plot: Option<PathBuf>,
    },

    /// Download and merge every file of a Datalakes dataset
    Datalakes {
        #[arg(long)]
        dataset_id: u64,

        #[arg(long)]
        start: String,

        #[arg(long)]
        end: String,

        /// thermochain, idronaut, adcp_deep_velocity or adcp_near_surface_velocity
        #[arg(long, default_value = "thermochain")]
        kind: SourceKind,

        /// json or nc
        #[arg(long, default_value = "json")]
        datatype: Datatype,

        /// Folder downloaded NetCDF files are kept in
        #[arg(long, default_value = "./temp")]
        temp_folder: PathBuf,

        /// Where the merged dataset is written as JSON
        #[arg(short = 'o', long)]
        output: PathBuf,

        /// Variable and depth (negative down) of an optional timeseries chart
        #[arg(long, requires = "plot_depth")]
        plot_variable: Option<String>,

        #[arg(long, allow_negative_numbers = true)]
        plot_depth: Option<f64>,

        #[arg(long, requires = "plot_variable")]
        plot: Option<PathBuf>,
    },

    /// Extract a timeseries from Delft3D-Flow output at the cell nearest a point
    Delft3dTimeseries {
        /// NetCDF output file
        #[arg(short = 'f', long)]
        file: PathBuf,

        /// Variable name, e.g. R1 for temperature
        #[arg(long)]
        variable: String,

        #[arg(long, allow_negative_numbers = true)]
        x: f64,

        #[arg(long, allow_negative_numbers = true)]
        y: f64,

        /// Depth in metres
        #[arg(long)]
        depth: f64,

        #[arg(short = 'o', long)]
        output: PathBuf,

        #[arg(long)]
        plot: Option<PathBuf>,
    },

    /// Render a horizontal map of Delft3D-Flow output at one depth and instant
    Delft3dMap {
        #[arg(short = 'f', long)]
        file: PathBuf,

        #[arg(long)]
        variable: String,

        #[arg(long)]
        depth: f64,

        /// Instant of the frame; the closest model time is used
        #[arg(long)]
        date: String,

        /// Draw cells at their model coordinates instead of grid indices
        #[arg(long)]
        xy: bool,

        #[arg(short = 'o', long)]
        output: PathBuf,
    },

    /// Animate a constant slice through MITgcm iteration files
    Animate {
        /// Variable prefix, e.g. T
        #[arg(long)]
        var: String,

        /// Name of the GIF file
        #[arg(long)]
        movie_name: String,

        /// Axis to slice: x, y or z
        #[arg(long)]
        cut_var: CutAxis,

        /// Level to slice at; must exist in the grid
        #[arg(long, allow_negative_numbers = true)]
        cut_val: f64,

        /// Model seconds per iteration
        #[arg(long)]
        sec_per_iter: f64,

        /// Iterations to draw; all files matching --namespec by default
        #[arg(long, value_delimiter = ',')]
        iters: Option<Vec<u64>>,

        #[arg(long, default_value = "output_{iter}.nc")]
        namespec: String,

        #[arg(long, allow_negative_numbers = true)]
        vmin: Option<f64>,

        #[arg(long, allow_negative_numbers = true)]
        vmax: Option<f64>,

        #[arg(long, default_value = "PNG_IMAGES")]
        image_folder_name: PathBuf,

        #[arg(long, default_value = "GIF_MOVIES")]
        gif_folder_name: PathBuf,

        /// Save still frames as NAME with the iteration before the extension
        #[arg(long)]
        image_name: Option<String>,

        #[arg(long, default_value_t = 2)]
        fps: u32,

        #[arg(long, default_value = "cmocean/thermal")]
        cmap: String,

        /// Colour of cells under the bed
        #[arg(long, default_value = "#603a17")]
        landmask: String,

        /// Do not mask cells under the bed
        #[arg(long)]
        no_landmask: bool,

        /// Overlay velocity arrows (needs U, V and W)
        #[arg(long)]
        velocity_field: bool,

        #[arg(long, default_value_t = 3)]
        stride: usize,

        #[arg(long)]
        xstride: Option<usize>,

        #[arg(long)]
        ystride: Option<usize>,

        #[arg(long)]
        zstride: Option<usize>,

        #[arg(long, default_value_t = 20.0)]
        scale: f64,
    },

    /// Look up a colormap, or list them all
    Colormap {
        /// name or package/name; lists every colormap when omitted
        name: Option<String>,
    },

    /// RMSE of a saved model series against saved measurements
    Validate {
        /// JSON array written by one of the retrieval commands
        #[arg(long)]
        model: PathBuf,

        /// Measurements, snapped onto the model's axis by nearest label
        #[arg(long)]
        measured: PathBuf,

        /// Match measurements past the end of the model axis too
        #[arg(long)]
        unbounded: bool,
    },
}

pub async fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::AlplakesTimeseries {
            lake,
            lat,
            lon,
            start,
            end,
            depth,
            output,
            plot,
        } => alplakes::run_timeseries(&lake, lat, lon, &start, &end, depth, &output, plot.as_deref()).await,
        Command::AlplakesProfile {
            lake,
            lat,
            lon,
            date,
            output,
            plot,
        } => alplakes::run_profile(&lake, lat, lon, &date, &output, plot.as_deref()).await,
        Command::AlplakesDirectory {
            dir,
            layout,
            output,
            plot,
        } => alplakes::run_directory(&dir, layout, &output, plot.as_deref()),
        Command::Datalakes {
            dataset_id,
            start,
            end,
            kind,
            datatype,
            temp_folder,
            output,
            plot_variable,
            plot_depth,
            plot,
        } => {
            let chart = match (plot_variable, plot_depth, plot) {
                (Some(variable), Some(depth), Some(path)) => Some(datalakes::DepthChart { variable, depth, path }),
                _ => None,
            };
            datalakes::run_datalakes(dataset_id, &start, &end, kind, datatype, &temp_folder, &output, chart).await
        }
        Command::Delft3dTimeseries {
            file,
            variable,
            x,
            y,
            depth,
            output,
            plot,
        } => delft3d::run_timeseries(&file, &variable, x, y, depth, &output, plot.as_deref()),
        Command::Delft3dMap {
            file,
            variable,
            depth,
            date,
            xy,
            output,
        } => delft3d::run_map(&file, &variable, depth, &date, xy, &output),
        Command::Animate {
            var,
            movie_name,
            cut_var,
            cut_val,
            sec_per_iter,
            iters,
            namespec,
            vmin,
            vmax,
            image_folder_name,
            gif_folder_name,
            image_name,
            fps,
            cmap,
            landmask,
            no_landmask,
            velocity_field,
            stride,
            xstride,
            ystride,
            zstride,
            scale,
        } => {
            let config = limno_plot::animate::AnimationConfig {
                iters,
                namespec,
                vmin,
                vmax,
                image_folder_name,
                gif_folder_name,
                image_name,
                fps,
                cmap,
                landmask: if no_landmask { None } else { Some(landmask) },
                velocity_field,
                stride,
                xstride,
                ystride,
                zstride,
                scale,
                ..limno_plot::animate::AnimationConfig::new(&var, &movie_name, cut_var, cut_val, sec_per_iter)
            };
            animate::run_animate(&config)
        }
        Command::Colormap { name } => animate::run_colormap(name.as_deref()),
        Command::Validate {
            model,
            measured,
            unbounded,
        } => validate::run_validate(&model, &measured, unbounded),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(subcommand)]
        command: Command,
    }

    fn parse(args: &[&str]) -> Command {
        TestCli::try_parse_from(std::iter::once("limno").chain(args.iter().copied()))
            .unwrap()
            .command
    }

    #[test]
    fn test_parse_datalakes() {
        let command = parse(&[
            "datalakes",
            "--dataset-id",
            "515",
            "--start",
            "2024-01-01",
            "--end",
            "2024-02-01",
            "--kind",
            "idronaut",
            "-o",
            "out.json",
        ]);
        match command {
            Command::Datalakes {
                dataset_id,
                kind,
                datatype,
                plot,
                ..
            } => {
                assert_eq!(dataset_id, 515);
                assert_eq!(kind, SourceKind::Idronaut);
                assert_eq!(datatype, Datatype::Json);
                assert!(plot.is_none());
            }
            _ => panic!("wrong command"),
        }
    }

    #[test]
    fn test_parse_alplakes_directory_layout() {
        match parse(&["alplakes-directory", "-d", "exports", "-o", "out.json"]) {
            Command::AlplakesDirectory { layout, .. } => assert_eq!(layout, ExportLayout::Point),
            _ => panic!("wrong command"),
        }
        match parse(&["alplakes-directory", "-d", "exports", "--layout", "simstrat-surface", "-o", "out.json"]) {
            Command::AlplakesDirectory { layout, .. } => assert_eq!(layout, ExportLayout::SimstratSurface),
            _ => panic!("wrong command"),
        }
    }

    #[test]
    fn test_parse_animate_accepts_negative_cut() {
        let command = parse(&[
            "animate",
            "--var",
            "T",
            "--movie-name",
            "temp",
            "--cut-var",
            "z",
            "--cut-val",
            "-2.5",
            "--sec-per-iter",
            "6",
            "--iters",
            "10,20",
        ]);
        match command {
            Command::Animate {
                cut_var,
                cut_val,
                iters,
                cmap,
                fps,
                ..
            } => {
                assert_eq!(cut_var, CutAxis::Z);
                assert_eq!(cut_val, -2.5);
                assert_eq!(iters, Some(vec![10, 20]));
                assert_eq!(cmap, "cmocean/thermal");
                assert_eq!(fps, 2);
            }
            _ => panic!("wrong command"),
        }
    }

    #[test]
    fn test_parse_rejects_unknown_kind() {
        let parsed = TestCli::try_parse_from([
            "limno", "datalakes", "--dataset-id", "1", "--start", "2024-01-01", "--end", "2024-01-02", "--kind",
            "sonar", "-o", "x.json",
        ]);
        assert!(parsed.is_err());
    }
}
