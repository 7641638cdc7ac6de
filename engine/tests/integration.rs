use std::env;
use std::fs;
use std::path::Path;

use anyhow::anyhow;
use datatest_stable::{harness, Result};

use timeguard_engine::analyze;
use timeguard_engine::settings::Settings;

#[derive(Copy, Clone)]
enum Verbosity {
    None,
    Normal,
    Verbose,
}

fn run_test(path_output: &Path) -> Result<()> {
    // config based on environment variable
    let keep = env::var("KEEP").map_or(false, |v| v == "1");
    let verbosity =
        env::var("LOG").map_or(Verbosity::None, |v| match v.parse::<usize>().unwrap() {
            0 => Verbosity::None,
            1 => Verbosity::Normal,
            _ => Verbosity::Verbose,
        });

    // load the expected result
    let expected = fs::read_to_string(path_output)
        .expect("unable to load content from the expected output file");

    // locate the test case
    let path_dir = path_output
        .parent()
        .expect("unable to locate the test case directory");
    let path_class = path_dir.join("class.json");
    let path_settings = path_dir.join("settings.json");
    let path_obtained = path_dir.join("obtained");
    if path_obtained.exists() {
        fs::remove_file(&path_obtained)?;
    }

    let settings = if path_settings.exists() {
        Settings::load(&path_settings)?
    } else {
        Settings::default()
    };

    // run the verification, errors are part of the expected output
    let obtained = match analyze(&path_class, settings, vec![]) {
        Ok(report) => {
            if matches!(verbosity, Verbosity::Verbose) {
                for (property, verdict) in &report.verdicts {
                    println!("{}: {}", property, verdict);
                }
            }
            report.to_string()
        }
        Err(err) => {
            if matches!(verbosity, Verbosity::Normal | Verbosity::Verbose) {
                println!("Analysis failed: {}", err);
            }
            err.to_string()
        }
    };

    let success = expected.trim() == obtained.trim();
    if !success {
        println!(
            "Result mismatch:\n{}\n<- expected vs obtained ->\n{}",
            expected.trim(),
            obtained.trim()
        );
    }

    // save the obtained result on failed test cases, if requested
    if keep && !success {
        fs::write(&path_obtained, &obtained)?;
    }

    // report back
    if success {
        Ok(())
    } else {
        Err(anyhow!("result does not match with expectation").into())
    }
}

harness!(run_test, "tests/cases", r"output$");
