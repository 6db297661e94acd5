use honggfuzz::fuzz;
use sfntcarve::{scan_hits, Carver, Config};
use std::io::Cursor;

fn main() {
    loop {
        fuzz!(|data: &[u8]| {
            let config = Config {
                chunk_size: 7,
                save_unidentified: true,
                dry_run: true,
                ..Config::default()
            };
            let carver = Carver::new(config).unwrap();
            let hits = scan_hits(Cursor::new(data), 7).unwrap();
            let mut cur = Cursor::new(data);
            let summary = carver.analyze(&mut cur, &hits, data.len() as u64).unwrap();
            for target in summary.targets() {
                assert!(target.start_offset + target.length <= data.len() as u64);
            }
        });
    }
}
