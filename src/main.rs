use color_eyre::Result;

use slurmgrid::app::App;
use slurmgrid::args::Args;
use slurmgrid::logging::setup_logging;

fn main() -> Result<()> {
    color_eyre::install()?;

    let args: Args = argh::from_env();
    if args.version {
        println!("slurmgrid v{}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    setup_logging(args.verbose);

    App::new(&args)?.run()
}
