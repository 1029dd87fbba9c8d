//! Interactive facility picker.
//!
//! This is intentionally kept separate from clap parsing:
//! - clap handles structured flags/subcommands
//! - the picker provides the "run `hospi forecast` and choose a facility"
//!   UX when no facility was passed
//!
//! The candidate list comes from the facility catalog.

use std::io::{self, Write};

use crate::error::ForecastError;

/// Prompt the user to select a facility from the catalog.
///
/// Behavior:
/// - list the known facilities
/// - accept either a number (from the list) or free text used as a
///   substring query
/// - `q` cancels
pub fn prompt_for_facility(facilities: &[String]) -> Result<String, ForecastError> {
    if facilities.is_empty() {
        return Err(ForecastError::history(
            "el catálogo de establecimientos está vacío".to_string(),
        ));
    }

    println!("{} establecimientos conocidos:", facilities.len());
    for (idx, name) in facilities.iter().enumerate() {
        println!("{:>3}) {name}", idx + 1);
    }

    loop {
        print!(
            "Elija un establecimiento (1-{}) o escriba un nombre (q para salir): ",
            facilities.len()
        );
        io::stdout()
            .flush()
            .map_err(|e| ForecastError::malformed(format!("no se pudo escribir el prompt: {e}")))?;

        let mut input = String::new();
        let bytes = io::stdin()
            .read_line(&mut input)
            .map_err(|e| ForecastError::malformed(format!("no se pudo leer la entrada: {e}")))?;

        if bytes == 0 {
            return Err(ForecastError::malformed(
                "sin entrada; use `hospi forecast -e <nombre>`".to_string(),
            ));
        }

        let input = input.trim();
        if input.eq_ignore_ascii_case("q") {
            return Err(ForecastError::malformed("cancelado".to_string()));
        }

        if let Ok(choice) = input.parse::<usize>() {
            if (1..=facilities.len()).contains(&choice) {
                return Ok(facilities[choice - 1].clone());
            }
            println!(
                "Opción inválida: {choice}. Ingrese un número entre 1 y {}.",
                facilities.len()
            );
            continue;
        }

        if !input.is_empty() {
            return Ok(input.to_string());
        }
    }
}
