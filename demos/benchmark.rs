#[macro_use]
extern crate log;
extern crate env_logger;
extern crate getopts;
extern crate hotstat;

use getopts::Options;
use hotstat::{
    recorder::distribution_fields, DataRecorder, DistributionDataRecorder, Publisher, RangeDataRecorder, RangeList,
    SessionManager, StatsError,
};
use std::{
    env,
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

const OK: &str = "benchmark.ok";
const TOTAL: &str = "benchmark.total";

struct Generator {
    manager: Arc<SessionManager>,
}

impl Generator {
    fn new(manager: Arc<SessionManager>) -> Generator { Generator { manager } }

    fn run(&mut self) -> Result<(), StatsError> {
        let mut span = self.manager.span_tracker(OK)?;
        let incidents = self.manager.incident_tracker(TOTAL)?;
        loop {
            span.track();
            incidents.incident();
            span.commit();
        }
    }
}

fn recorders(key: &str) -> Result<Vec<Box<dyn DataRecorder>>, StatsError> {
    let mut recorders: Vec<Box<dyn DataRecorder>> = vec![Box::new(DistributionDataRecorder::new())];
    if key == OK {
        let ranges = RangeList::from_breakpoints(&[0.0, 0.001, 0.01, 0.1, 1.0], false)?;
        recorders.push(Box::new(RangeDataRecorder::new(ranges)?));
    }
    Ok(recorders)
}

fn print_usage(program: &str, opts: &Options) {
    let brief = format!("Usage: {} [options]", program);
    print!("{}", opts.usage(&brief));
}

pub fn opts() -> Options {
    let mut opts = Options::new();

    opts.optopt("p", "producers", "number of producers", "INTEGER");
    opts.optopt("d", "duration", "number of seconds to run for", "INTEGER");
    opts.optflag("h", "help", "print this help menu");

    opts
}

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let program = &args[0];
    let opts = opts();

    let matches = match opts.parse(&args[1..]) {
        Ok(m) => m,
        Err(f) => {
            error!("Failed to parse command line args: {}", f);
            return;
        },
    };

    if matches.opt_present("help") {
        print_usage(program, &opts);
        return;
    }

    info!("hotstat benchmark");

    let producers: usize = matches
        .opt_str("producers")
        .unwrap_or_else(|| "1".to_owned())
        .parse()
        .unwrap();
    let duration: u64 = matches
        .opt_str("duration")
        .unwrap_or_else(|| "60".to_owned())
        .parse()
        .unwrap();

    info!("producers: {}", producers);
    info!("duration: {}s", duration);

    let manager = Arc::new(
        SessionManager::builder()
            .recorders(recorders)
            .snapshot_interval(Duration::from_secs(3600))
            .build(),
    );

    info!("session manager configured");

    // Spin up our producers.
    for _ in 0..producers {
        let manager = manager.clone();
        thread::spawn(move || {
            if let Err(e) = Generator::new(manager).run() {
                error!("producer failed: {}", e);
            }
        });
    }

    // Spin up the publisher and let 'er rip.
    let mut publisher = Publisher::new(manager);
    let controller = publisher.get_controller();

    thread::spawn(move || {
        publisher.run();
    });

    // Poll the controller to figure out the commit rate.
    let mut total = 0;
    let mut t0 = Instant::now();
    for _ in 0..duration {
        let t1 = Instant::now();

        let snapshot = controller.get_snapshot().unwrap();
        let mut turn_total = 0;
        for key in &[OK, TOTAL] {
            if let Some(data) = snapshot.get(key) {
                turn_total += data.get_long_by_name("commits");
            }
        }

        let turn_delta = turn_total - total;
        total = turn_total;
        let rate = turn_delta as f64 / (t1 - t0).as_secs_f64();

        info!("rate: {} commits per second", rate);
        if let Some(data) = snapshot.get(OK) {
            info!(
                "span (ms): mean: {} stddev: {} min: {} max: {}",
                data.get_double(&distribution_fields::ARITHMETIC_MEAN),
                data.get_double(&distribution_fields::STANDARD_DEVIATION),
                data.get_double_by_name("min"),
                data.get_double_by_name("max"),
            );
            info!(
                "span buckets: {}",
                data.iter()
                    .filter(|(name, _)| name.contains('-'))
                    .map(|(name, value)| format!("{}={}", name, value))
                    .collect::<Vec<_>>()
                    .join(" ")
            );
        }

        t0 = t1;
        thread::sleep(Duration::new(1, 0));
    }

    let _ = controller.shutdown();
    info!("total commits: {}", total);
}
