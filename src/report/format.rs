//! Formatted terminal output for forecasts, catalog listings and sweeps.
//!
//! We keep formatting code in one place so:
//! - the pipeline code stays clean and testable
//! - output changes are localized (important for future snapshot tests)

use crate::domain::ForecastResult;

/// Format the full forecast summary for one facility.
pub fn format_forecast_summary(result: &ForecastResult) -> String {
    let mut out = String::new();

    out.push_str("=== hospi - Pronóstico de capacidad hospitalaria ===\n");
    out.push_str(&format!(
        "Establecimiento: {}\n",
        result.establecimiento_nombre
    ));
    out.push_str(&format!(
        "Periodo: {} | Escenario: {}\n",
        result.fecha_prediccion, result.escenario
    ));

    out.push_str("\nPredicciones:\n");
    out.push_str(&format!("- Consultas médicas: {}\n", result.consultas_pred));
    out.push_str(&format!("- Cirugías: {}\n", result.cirugias_pred));
    out.push_str(&format!("- Urgencias: {}\n", result.urgencias_pred));
    out.push_str(&format!(
        "- Ocupación: {:.2}% (camas {}/{} ocupadas, {} libres)\n",
        result.porcentaje_ocupacion_pred,
        result.camas_ocupadas,
        result.camas_ocupadas + result.camas_libres,
        result.camas_libres
    ));

    out.push_str(&format!(
        "\nAlerta: {}{}\n",
        result.nivel_alerta.display_name(),
        if result.alerta { " (!)" } else { "" }
    ));
    out.push_str(&format!(
        "Confianza: {:.2} ({})\n",
        result.confianza,
        result.nivel_confianza.display_name()
    ));
    out.push_str(&format!("Recomendación: {}\n", result.recomendacion));
    out.push_str(&format!("Generado: {}\n", result.timestamp));

    out
}

/// Format the facility catalog, one name per numbered line.
pub fn format_facilities(names: &[String]) -> String {
    let mut out = String::new();
    out.push_str(&format!("{} establecimientos conocidos:\n", names.len()));
    for (idx, name) in names.iter().enumerate() {
        out.push_str(&format!("{:>3}) {name}\n", idx + 1));
    }
    out
}

/// Sort sweep results by predicted occupancy, highest pressure first.
pub fn rank_by_occupancy(mut results: Vec<ForecastResult>) -> Vec<ForecastResult> {
    results.sort_by(|a, b| {
        b.porcentaje_ocupacion_pred
            .partial_cmp(&a.porcentaje_ocupacion_pred)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    results
}

/// Format the ranked sweep table (top-N rows; 0 shows everything).
pub fn format_sweep_rankings(ranked: &[ForecastResult], top_n: usize) -> String {
    let shown = if top_n == 0 {
        ranked.len()
    } else {
        top_n.min(ranked.len())
    };

    let mut out = String::new();
    out.push_str(&format!(
        "Establecimientos por ocupación prevista (top {shown} de {}):\n",
        ranked.len()
    ));
    for (idx, row) in ranked.iter().take(shown).enumerate() {
        let marker = if row.alerta { "!" } else { " " };
        out.push_str(&format!(
            "{:>3}) {marker} {:<45} {:>6.2}%  camas libres {:>3}  alerta {}\n",
            idx + 1,
            row.establecimiento_nombre,
            row.porcentaje_ocupacion_pred,
            row.camas_libres,
            row.nivel_alerta.display_name()
        ));
    }
    out
}
