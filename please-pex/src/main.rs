// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

fn main() {
    let exit_code = match please_pexlib::cli::run() {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("error: {:?}", e);
            1
        }
    };

    std::process::exit(exit_code);
}
