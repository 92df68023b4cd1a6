// tests/pipeline_e2e.rs
use std::fs;
use std::path::Path;

use os_pipeline::config::options::{GroupKey, PipelineOptions};
use os_pipeline::model::ReleasedBy;
use os_pipeline::progress::{NullProgress, Progress};
use os_pipeline::runner;
use os_pipeline::store::{load_archive, load_orders};
use os_pipeline::config::options::DecodePolicy;

const HEADER: &str = "Unidade;Status;Data Entrada;Previsão Saída;Data Saída;OS;Frota;Modelo;Solicitante;Prestador;Serviço";

fn write_export(dir: &Path, name: &str, rows: &[&str]) -> std::path::PathBuf {
    let path = dir.join(name);
    let mut text = String::from(HEADER);
    for r in rows {
        text.push('\n');
        text.push_str(r);
    }
    fs::write(&path, text).unwrap();
    path
}

fn options(input: &Path, out: &Path) -> PipelineOptions {
    PipelineOptions { input: input.to_path_buf(), out_dir: out.to_path_buf(), ..Default::default() }
}

#[test]
fn only_the_open_allowed_row_survives_and_lands_with_mauricio() {
    let tmp = tempfile::tempdir().unwrap();
    let input = write_export(
        tmp.path(),
        "export.csv",
        &[
            "4;ABERTO;10/04/2025;2025-05-01;;101;F1;Actros;Ana;Oficina A;Liberado Sr. Mauricio, aguardando peça",
            "6;ABERTO;10/04/2025;01/05/2025;;102;F2;Actros;Ana;Oficina A;Liberado pelo gestor",
            "5;FECHADO;10/04/2025;01/05/2025;;103;F3;Actros;Ana;Oficina B;x",
        ],
    );
    let out = tmp.path().join("out");
    let opts = options(&input, &out);

    let summary = runner::run(&opts, Some(&mut NullProgress as &mut dyn Progress)).unwrap();
    assert_eq!(summary.normalize.rows_in, 3);
    assert_eq!(summary.normalize.kept, 1);
    assert_eq!(summary.parse.parsed, 1);
    assert_eq!(summary.by_release[&ReleasedBy::Mauricio], 1);
    assert_eq!(summary.by_release[&ReleasedBy::Gestor], 0);
    assert_eq!(summary.groups, 1);

    let doc = fs::read_to_string(opts.text_document_path()).unwrap();
    assert!(doc.contains("OS: 101"));
    assert!(!doc.contains("OS: 102"));

    let (mauricio, _) = load_orders(&opts.release_dir().join("mauricio.json"), DecodePolicy::Abort).unwrap();
    assert_eq!(mauricio.len(), 1);
    assert_eq!(mauricio[0].order.order_id, "101");

    let group = load_archive(&opts.group_dir().join("oficina_a.json"), DecodePolicy::Abort).unwrap();
    assert_eq!(group.records.len(), 1);
    assert!(opts.missing_estimate_path().is_file());
}

#[test]
fn provider_spellings_merge_and_stale_archives_go() {
    let tmp = tempfile::tempdir().unwrap();
    let input = write_export(
        tmp.path(),
        "export.csv",
        &[
            "4;ABERTO;10/04/2025;01/05/2025;;201;F1;M;Ana;João Só;x",
            "5;ABERTO;11/04/2025;02/05/2025;;202;F2;M;Ana;JOAO SO;y",
            "4;ABERTO;12/04/2025;;;203;F3;M;Ana;;z",
        ],
    );
    let out = tmp.path().join("out");
    let opts = options(&input, &out);
    fs::create_dir_all(opts.group_dir()).unwrap();
    fs::write(opts.group_dir().join("antiga.json"), "[]").unwrap();

    let summary = runner::run(&opts, None).unwrap();
    // Row 203 has no estimate and is filtered before grouping.
    assert_eq!(summary.normalize.kept, 2);
    assert_eq!(summary.groups, 1);
    assert_eq!(summary.stale_removed, 1);

    let merged = load_archive(&opts.group_dir().join("joao_so.json"), DecodePolicy::Abort).unwrap();
    assert_eq!(merged.records.len(), 2);
    assert!(!opts.group_dir().join("antiga.json").exists());
}

#[test]
fn manager_mode_names_the_archive_after_the_input_file() {
    let tmp = tempfile::tempdir().unwrap();
    let input = write_export(tmp.path(), "ana paula.csv", &["4;ABERTO;10/04/2025;01/05/2025;;301;F1;M;Ana;;x"]);
    let out = tmp.path().join("out");
    let mut opts = options(&input, &out);
    opts.group = GroupKey::Manager(String::new());

    let summary = runner::run(&opts, None).unwrap();
    assert_eq!(summary.groups, 1);
    assert!(opts.group_dir().join("ANA_PAULA.json").is_file());
}

#[test]
fn directory_input_picks_an_export_inside() {
    let tmp = tempfile::tempdir().unwrap();
    let exports = tmp.path().join("exports");
    fs::create_dir_all(&exports).unwrap();
    write_export(&exports, "semana.csv", &["4;ABERTO;10/04/2025;01/05/2025;;401;F1;M;Ana;Oficina;x"]);
    let out = tmp.path().join("out");

    let summary = runner::run(&options(&exports, &out), None).unwrap();
    assert!(summary.input.ends_with("semana.csv"));
    assert_eq!(summary.normalize.kept, 1);
}

#[test]
fn missing_columns_abort_before_anything_is_written() {
    let tmp = tempfile::tempdir().unwrap();
    let input = tmp.path().join("ruim.csv");
    fs::write(&input, "Unidade;Status\n4;ABERTO\n").unwrap();
    let out = tmp.path().join("out");

    assert!(runner::run(&options(&input, &out), None).is_err());
    assert!(!out.join("ordens.txt").exists());
}
