//! Reference bot: fires at the first cell it knows nothing about.
//!
//! Invoked as `sequential_bot <outcome grid>`, where the grid is the
//! comma-separated list of cell codes sent by the runner.

fn main() {
    let args: Vec<String> = std::env::args().collect();
    if args.len() != 2 {
        eprintln!("Usage: {} <grid>", args[0]);
        std::process::exit(1);
    }
    match args[1].split(',').position(|cell| cell.trim() == "0") {
        Some(index) => println!("{}", index),
        None => {
            eprintln!("no unknown cells left");
            std::process::exit(2);
        }
    }
}
