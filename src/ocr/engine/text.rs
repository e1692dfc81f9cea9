/// Cleans raw tesseract output: drops form feeds and trailing spaces, collapses blank-line runs.
pub(super) fn normalize_ocr_text(raw: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    let mut blank_run = 0usize;
    for line in raw.split(['\n', '\x0c']) {
        let line = line.trim_end();
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run == 1 && !lines.is_empty() {
                lines.push("");
            }
            continue;
        }
        blank_run = 0;
        lines.push(line);
    }
    while lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }
    lines.join("\n")
}
