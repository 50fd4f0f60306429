//! Prints every time a cron expression matches on the given day

use cron2ical::expand::{expand, DayWindow};
use cron2ical::Cron;

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let (expr, day) = match (args.get(1), args.get(2)) {
        (Some(expr), Some(day)) => (expr, day),
        _ => {
            println!("Usage: cargo run --example day-times -- \"[cron expression]\" dd-mm-yyyy");
            return;
        }
    };

    let cron = match expr.parse::<Cron>() {
        Ok(cron) => cron,
        Err(err) => return println!("{}", err),
    };
    let window = match day.parse::<DayWindow>() {
        Ok(window) => window,
        Err(err) => return println!("{}", err),
    };

    if !cron.any() {
        println!("Cron will never match any given time!");
        return;
    }

    for occurrence in expand(&cron, expr, &window) {
        if !cron.contains(occurrence.start) {
            println!("Failed check! Cron does not contain {}.", occurrence.start);
            break;
        }
        println!("{}", occurrence.start.format("%F %R"));
    }
}
