use clap::Parser;

fn main() {
    let args = lc3objcheck::cli::Args::parse();
    if let Err(err) = lc3objcheck::run(args) {
        eprintln!("{}", lc3objcheck::checker::failure_message(&err));
        std::process::exit(lc3objcheck::checker::exit_code(&err));
    }
}
