use assert_cmd::Command;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::{self, contains};
use std::fs;
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};

fn delimport() -> Command {
    Command::cargo_bin("delimport").expect("binary built")
}

fn input(suffix: &str, contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("create temp file");
    file.write_all(contents.as_bytes()).expect("write temp file");
    file
}

const PEOPLE: &str = "name,age\nada,36\n\"lovelace, a\",37\n";

#[test]
fn version() {
    let assert = delimport().arg("-V").assert();
    assert.success().stdout(str::starts_with("delimport "));
}

#[test]
fn help() {
    let assert = delimport().arg("-h").assert();
    assert.success().stdout(str::contains("\nUsage"));
}

#[test]
fn missing_path_is_a_usage_error() {
    delimport().assert().code(64).stderr(contains("PATH"));
}

#[test]
fn csv_rows_as_text() {
    let file = input(".csv", PEOPLE);
    delimport()
        .arg(file.path())
        .assert()
        .success()
        .stdout("ada\t36\nlovelace, a\t37\n");
}

#[test]
fn custom_text_delimiter() {
    let file = input(".csv", PEOPLE);
    delimport()
        .arg(file.path())
        .args(["-d", "\\x1f"])
        .assert()
        .success()
        .stdout("ada\u{1f}36\nlovelace, a\u{1f}37\n");
}

#[test]
fn rows_as_json_lines() {
    let file = input(".csv", PEOPLE);
    delimport()
        .arg(file.path())
        .args(["-s", "json"])
        .assert()
        .success()
        .stdout("{\"name\":\"ada\",\"age\":\"36\"}\n{\"name\":\"lovelace, a\",\"age\":\"37\"}\n");
}

#[test]
fn rows_as_csv_with_header() {
    let file = input(".csv", PEOPLE);
    delimport()
        .arg(file.path())
        .arg("--serialization=csv")
        .assert()
        .success()
        .stdout("name,age\nada,36\n\"lovelace, a\",37\n");
}

#[test]
fn format_guessed_from_extension() {
    let file = input(".tsv", "k\tv\na\t1\nb\t2\n");
    delimport()
        .arg(file.path())
        .args(["-d", ","])
        .assert()
        .success()
        .stdout("a,1\nb,2\n");
}

#[test]
fn explicit_pipe_format() {
    let file = input(".dat", "k|v\na|1\nb|2\n");
    delimport()
        .arg(file.path())
        .args(["--format", "pipe", "--window-size", "3"])
        .assert()
        .success()
        .stdout("k\tv\na\t1\nb\t2\n");
}

#[test]
fn declared_header_with_record_cap() {
    let file = input(".csv", "n\n1\n2\n3\n4\n");
    delimport()
        .arg(file.path())
        .args(["--header", "--max-records", "2", "-w", "2"])
        .assert()
        .success()
        .stdout("1\n2\n");
}

#[test]
fn no_header_delivers_first_record() {
    let file = input(".csv", PEOPLE);
    delimport()
        .arg(file.path())
        .arg("--no-header")
        .assert()
        .success()
        .stdout(contains("name\tage\n"));
}

#[test]
fn max_records_requires_header_mode() {
    let file = input(".csv", PEOPLE);
    delimport()
        .arg(file.path())
        .args(["-m", "1"])
        .assert()
        .code(64)
        .stderr(contains("--max-records requires --header or --no-header"));
}

#[test]
fn header_flags_conflict() {
    let file = input(".csv", PEOPLE);
    delimport()
        .arg(file.path())
        .args(["--header", "--no-header"])
        .assert()
        .code(64);
}

#[test]
fn zero_window_size_is_rejected() {
    let file = input(".csv", PEOPLE);
    delimport()
        .arg(file.path())
        .args(["-w", "0"])
        .assert()
        .code(64);
}

#[test]
fn missing_input_file() {
    delimport()
        .arg("no/such/file.csv")
        .assert()
        .code(66)
        .stderr(contains("no such file").and(contains("no/such/file.csv")));
}

#[test]
fn text_after_closing_quote_is_kept() {
    let file = input(".csv", "a,b\n\"x\"y,1\n");
    delimport()
        .arg(file.path())
        .arg("--no-header")
        .assert()
        .success()
        .stdout("a\tb\nxy\t1\n");
}

#[test]
fn txt_extension_is_read_as_csv() {
    let file = input(".txt", PEOPLE);
    delimport()
        .arg(file.path())
        .assert()
        .success()
        .stdout("ada\t36\nlovelace, a\t37\n");
}

#[test]
fn directory_input_is_an_io_error() {
    let dir = TempDir::new().expect("create temp dir");
    fs::write(dir.path().join("rows.csv"), PEOPLE).expect("write file in dir");
    delimport()
        .arg(dir.path())
        .assert()
        .code(74)
        .stderr(contains("failed to map"));
}

#[test]
fn unterminated_quote_is_a_data_error() {
    let file = input(".csv", "a,b\n1,\"open");
    delimport()
        .arg(file.path())
        .assert()
        .code(65)
        .stderr(contains("unterminated quoted field"));
}

#[test]
fn empty_input_writes_nothing() {
    let file = input(".csv", "");
    delimport().arg(file.path()).assert().success().stdout("");
}

#[test]
fn output_file() {
    let dir = TempDir::new().expect("create temp dir");
    let out = dir.path().join("rows.txt");
    let file = input(".csv", PEOPLE);
    delimport()
        .arg(file.path())
        .arg("--output")
        .arg(&out)
        .assert()
        .success()
        .stdout("");

    let written = fs::read_to_string(&out).expect("read output file");
    assert_eq!(written, "ada\t36\nlovelace, a\t37\n");
}

#[test]
fn verbose_text_report() {
    let file = input(".csv", PEOPLE);
    let size = PEOPLE.len();
    delimport()
        .arg(file.path())
        .args(["-v", "-d", " "])
        .assert()
        .success()
        .stdout("ada 36\nlovelace, a 37\n")
        .stderr(contains(format!("format csv\nsize {size}\n")))
        .stderr(contains("windows 1\nsniffed 3\nheader true\nrecords 2\ncolumns name:string,age:int\n"));
}

#[test]
fn verbose_json_report() {
    let file = input(".csv", PEOPLE);
    delimport()
        .arg(file.path())
        .args(["-v", "-s", "json"])
        .assert()
        .success()
        .stderr(contains("\"records\":2").and(contains("\"header\":true")))
        .stderr(contains("{\"name\":\"age\",\"type\":\"int\",\"width\":2}"));
}

#[test]
fn verbose_csv_report() {
    let file = input(".csv", PEOPLE);
    delimport()
        .arg(file.path())
        .args(["-v", "-s", "csv", "--no-header"])
        .assert()
        .success()
        .stderr(contains("source,format,size,window-len,windows,sniffed,header,records,columns\n"))
        .stderr(contains(",csv,").and(contains(",0,false,3,none\n")));
}
