mod app;
mod cli;

fn main() {
    let cli = cli::parse();
    app::init_logging(cli.verbose);
    app::run(cli);
}
