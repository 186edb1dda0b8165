//! End-to-end runs against stand-in converter and decompiler scripts.
//!
//! `d2j-dex2jar`, `apktool` and `java` are replaced by small shell scripts
//! that copy prepared files into place, so the whole flow from package to
//! output file runs without a JVM.
#![cfg(unix)]

use predicates::prelude::*;
use std::fs::{self, File};
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

const DEX2JAR_SCRIPT: &str = "#!/bin/sh\n# -f -o <jar> <dex>\ncp \"$FAKE_JAR\" \"$3\"\n";
const APKTOOL_SCRIPT: &str =
    "#!/bin/sh\n# d <apk> -o <dir> -f\nmkdir -p \"$4\"\ncp \"$FAKE_MANIFEST\" \"$4/AndroidManifest.xml\"\n";
const JAVA_SCRIPT: &str = "#!/bin/sh\n# -jar <fernflower> <class> <outdir>\nname=$(basename \"$3\" .class)\nif [ -f \"$FAKE_SOURCES/$name.java\" ]; then\n  cp \"$FAKE_SOURCES/$name.java\" \"$4/\"\nfi\n";

fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
    let mut zip = zip::ZipWriter::new(File::create(path).unwrap());
    for (name, data) in entries {
        zip.start_file(*name, SimpleFileOptions::default()).unwrap();
        zip.write_all(data).unwrap();
    }
    zip.finish().unwrap();
}

fn write_script(path: &Path, body: &str) {
    fs::write(path, body).unwrap();
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
}

struct Harness {
    dir: TempDir,
}

impl Harness {
    /// `classes` are class tree entries, `sources` map class stems to decompiled text
    fn new(package: &str, classes: &[&str], sources: &[(&str, &str)]) -> Self {
        let dir = TempDir::new().unwrap();
        let harness = Self { dir };

        let bin = harness.bin_dir();
        fs::create_dir_all(&bin).unwrap();
        write_script(&bin.join("d2j-dex2jar"), DEX2JAR_SCRIPT);
        write_script(&bin.join("apktool"), APKTOOL_SCRIPT);
        write_script(&bin.join("java"), JAVA_SCRIPT);

        write_zip(
            &harness.apk(),
            &[("classes.dex", b"dex\n035\0"), ("AndroidManifest.xml", b"\x03\x00\x08\x00")],
        );

        let entries: Vec<(&str, &[u8])> = classes.iter().map(|c| (*c, &b"\xca\xfe\xba\xbe"[..])).collect();
        write_zip(&harness.jar(), &entries);

        fs::write(
            harness.manifest(),
            format!(
                "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<manifest xmlns:android=\"http://schemas.android.com/apk/res/android\" package=\"{package}\"/>\n"
            ),
        )
        .unwrap();

        fs::create_dir_all(harness.sources()).unwrap();
        for (stem, text) in sources {
            fs::write(harness.sources().join(format!("{stem}.java")), text).unwrap();
        }

        fs::write(harness.dir.path().join("fernflower.jar"), b"PK").unwrap();
        fs::create_dir_all(harness.tmp()).unwrap();
        harness
    }

    fn bin_dir(&self) -> PathBuf {
        self.dir.path().join("bin")
    }

    fn apk(&self) -> PathBuf {
        self.dir.path().join("payload.apk")
    }

    fn jar(&self) -> PathBuf {
        self.dir.path().join("prepared-classes.jar")
    }

    fn manifest(&self) -> PathBuf {
        self.dir.path().join("AndroidManifest.xml")
    }

    fn sources(&self) -> PathBuf {
        self.dir.path().join("sources")
    }

    /// TMPDIR for the run, so working directories can be inspected
    fn tmp(&self) -> PathBuf {
        self.dir.path().join("tmp")
    }

    fn output(&self) -> PathBuf {
        self.dir.path().join("configbytes.txt")
    }

    fn workdirs(&self) -> Vec<PathBuf> {
        fs::read_dir(self.tmp())
            .unwrap()
            .filter_map(Result::ok)
            .map(|e| e.path())
            .filter(|p| p.file_name().unwrap().to_string_lossy().starts_with("configbytes-"))
            .collect()
    }

    fn command(&self) -> assert_cmd::Command {
        self.command_for(&self.apk())
    }

    fn command_for(&self, apk: &Path) -> assert_cmd::Command {
        let path = format!(
            "{}:{}",
            self.bin_dir().display(),
            std::env::var("PATH").unwrap_or_else(|_| "/usr/bin:/bin".to_string())
        );
        let mut cmd = assert_cmd::cargo_bin_cmd!("configbytes");
        cmd.env("PATH", path)
            .env("TMPDIR", self.tmp())
            .env("FAKE_JAR", self.jar())
            .env("FAKE_MANIFEST", self.manifest())
            .env("FAKE_SOURCES", self.sources())
            .env_remove("RUST_LOG")
            .arg("-a")
            .arg(apk)
            .arg("-j")
            .arg(self.dir.path().join("fernflower.jar"));
        cmd
    }
}

#[test]
fn test_known_payload_end_to_end() {
    let h = Harness::new(
        "org.meterpreter.stage",
        &["org/meterpreter/stage/Payload.class", "org/meterpreter/stage/MainActivity.class"],
        &[("Payload", "class Payload{ byte[] data = new byte[]{10, 20, 30, 255}; }")],
    );

    h.command()
        .arg("-o")
        .arg(h.output())
        .args(["-f", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"scenario\": \"known_payload\""))
        .stdout(predicate::str::contains("\"package\": \"org.meterpreter.stage\""))
        .stdout(predicate::str::contains("\"bytes_written\": 15"));

    assert_eq!(fs::read(h.output()).unwrap(), b"10, 20, 30, 255");
    assert!(h.workdirs().is_empty(), "working directory should be removed");
}

#[test]
fn test_backdoored_payload_end_to_end() {
    let h = Harness::new(
        "com.example.game",
        &["com/example/game/MainActivity.class", "com/example/game/qwert/asdfg.class"],
        &[("asdfg", "public class asdfg {\n   private static byte[] a = new byte[]{-37, 4, 16, 0};\n}")],
    );

    h.command()
        .arg("-o")
        .arg(h.output())
        .assert()
        .success()
        .stdout(predicate::str::contains("asdfg.class"));

    assert_eq!(fs::read(h.output()).unwrap(), b"-37, 4, 16, 0");
}

#[test]
fn test_not_found_removes_workdir() {
    let h = Harness::new("com.example.clean", &["com/example/clean/MainActivity.class"], &[]);

    h.command()
        .arg("-o")
        .arg(h.output())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unable to find payload class"));

    assert!(!h.output().exists());
    assert!(h.workdirs().is_empty(), "working directory should be removed");
}

#[test]
fn test_not_found_keeps_workdir_on_request() {
    let h = Harness::new("com.example.clean", &["com/example/clean/MainActivity.class"], &[]);

    h.command()
        .arg("-o")
        .arg(h.output())
        .arg("-k")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unable to find payload class"));

    let workdirs = h.workdirs();
    assert_eq!(workdirs.len(), 1);
    assert!(workdirs[0].join("classes/com/example/clean/MainActivity.class").is_file());
}

#[test]
fn test_default_output_keeps_workdir() {
    let h = Harness::new(
        "org.meterpreter.stage",
        &["org/meterpreter/stage/Payload.class"],
        &[("Payload", "byte[] a = new byte[]{1, 2, 3};")],
    );

    h.command()
        .assert()
        .success()
        .stdout(predicate::str::contains("workdir:"));

    let workdirs = h.workdirs();
    assert_eq!(workdirs.len(), 1);
    assert_eq!(fs::read(workdirs[0].join("configbytes.txt")).unwrap(), b"1, 2, 3");
}

#[test]
fn test_malformed_manifest_cleans_up() {
    let h = Harness::new("com.example.game", &["com/example/game/Payload.class"], &[]);
    fs::write(h.manifest(), "<manifest><application/></manifest>").unwrap();

    h.command()
        .arg("-o")
        .arg(h.output())
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing package attribute"));

    assert!(h.workdirs().is_empty());
}

#[test]
fn test_nonexistent_apk() {
    let h = Harness::new("com.example.game", &[], &[]);

    h.command_for(&h.dir.path().join("missing.apk"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("apk file does not exist"));
}
