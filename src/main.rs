// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! `lvx <drive-path> <lv-name>` -- recovers a Logical Volume's byte image
//! straight off a raw, GPT-partitioned block device and writes it to
//! `<lv-name>.bin` in the current directory.

use std::env;
use std::process::ExitCode;

use lvextract::drive::Drive;
use lvextract::sink;

fn usage(program: &str) -> String {
    format!("usage: {} <drive-path> <lv-name>", program)
}

fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let program = args.get(0).map(String::as_str).unwrap_or("lvx");
    if args.len() != 3 {
        eprintln!("{}", usage(program));
        return ExitCode::from(1);
    }
    let drive_path = &args[1];
    let lv_name = &args[2];

    let mut drive = match Drive::open(drive_path) {
        Ok(d) => d,
        Err(e) => {
            log::error!("failed to open '{}': {}", drive_path, e);
            return ExitCode::SUCCESS;
        }
    };

    match lvextract::extract_lv(&mut drive, lv_name) {
        Ok(buffer) => match sink::write_lv_image(".", lv_name, &buffer) {
            Ok(path) => {
                log::info!("wrote {} bytes to {}", buffer.len(), path.display());
                ExitCode::SUCCESS
            }
            Err(e) => {
                log::error!("failed to write output: {}", e);
                ExitCode::SUCCESS
            }
        },
        Err(e) => {
            log::error!("{}", e);
            ExitCode::SUCCESS
        }
    }
}
