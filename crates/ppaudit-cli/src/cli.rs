use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "ppaudit",
    about = "ppaudit: find missing post-processed output and request its regeneration",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Where the archive is and which part of it to inspect.
#[derive(Args, Debug, Clone)]
pub struct ArchiveArgs {
    /// Post-processing root (overrides `pp_root` from --config)
    pub pp_root: Option<String>,

    /// TOML config file with audit defaults
    #[arg(long)]
    pub config: Option<String>,

    /// Component directory prefix, e.g. ocean, atmos, land
    #[arg(long)]
    pub component: Option<String>,

    /// Output kind: ts (time series) or av (averages)
    #[arg(long)]
    pub kind: Option<String>,

    /// First end-year expected (overrides the first observed year)
    #[arg(long)]
    pub start_year: Option<i32>,

    /// Last end-year expected (overrides the last observed year)
    #[arg(long)]
    pub end_year: Option<i32>,

    /// Extension of output files, without the dot
    #[arg(long = "ext")]
    pub extension: Option<String>,

    /// Path component that starts directory labels
    #[arg(long)]
    pub pp_marker: Option<String>,
}

/// Experiment parameters that cannot be read from the pp path.
#[derive(Args, Debug, Clone)]
pub struct ToolingArgs {
    /// Path to the experiment XML
    #[arg(long = "xml")]
    pub xml_path: Option<String>,

    /// FRE module version loaded before frepp (e.g. bronx-20)
    #[arg(long)]
    pub fre_version: Option<String>,
}

/// How remediation requests are launched.
#[derive(Args, Debug, Clone)]
pub struct LauncherArgs {
    /// Shell used to run frepp
    #[arg(long, default_value = "sh")]
    pub shell: String,

    /// frepp executable name or path
    #[arg(long, default_value = "frepp")]
    pub frepp: String,

    /// Skip `module load fre/<version>` before frepp
    #[arg(long)]
    pub no_module: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Reconcile every segment length and report missing year cells
    Verify {
        #[command(flatten)]
        archive: ArchiveArgs,

        #[command(flatten)]
        tooling: ToolingArgs,

        #[command(flatten)]
        launcher: LauncherArgs,

        /// Run frepp for each missing cell, one at a time
        #[arg(long)]
        fix: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List segment directories found under the pp root
    Dirs {
        #[command(flatten)]
        archive: ArchiveArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Build the year series of a single output directory
    Series {
        /// Directory holding segment files
        dir: String,

        /// First end-year expected
        #[arg(long)]
        start_year: Option<i32>,

        /// Last end-year expected
        #[arg(long)]
        end_year: Option<i32>,

        /// Extension of output files, without the dot
        #[arg(long = "ext", default_value = "nc")]
        extension: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the experiment identity derived from a pp root path
    Metadata {
        /// Post-processing root
        pp_root: String,

        #[command(flatten)]
        tooling: ToolingArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Request regeneration of one component/year
    Fix {
        /// Component to regenerate, e.g. ocean_monthly
        component: String,

        /// End-year of the segment to regenerate
        year: i32,

        /// Post-processing root the experiment identity is read from
        #[arg(long)]
        pp_root: String,

        #[command(flatten)]
        tooling: ToolingArgs,

        #[command(flatten)]
        launcher: LauncherArgs,

        /// Print the request without running it
        #[arg(long)]
        dry_run: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
