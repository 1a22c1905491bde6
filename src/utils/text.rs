/// "3.14159..." from a digit string with the point implied after the
/// first digit.
pub fn format_pi(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + 1);
    let (head, tail) = digits.split_at(digits.len().min(1));
    out.push_str(head);
    out.push('.');
    out.push_str(tail);
    out
}

pub fn usage() -> String {
    let options = [
        ("-h/?", "Print this help"),
        ("-digits num_digits", "Number of pi digits to compute"),
        ("-f output_file", "The output file (default: stdout)"),
        ("-json", "Print a JSON report of sizes and timings"),
    ];

    let mut output = String::from("\n Usage: chudnovsky [OPTIONS] [num_digits]\n\n  Options:\n");
    for (flag, text) in options.iter() {
        output.push_str(&format!("   {:<20} {}\n", flag, text));
    }
    output.push_str("\n  Environment: PI_DIGITS, PI_OUTPUT, PI_SPLIT_RATIO, PI_GCD_LEVEL,\n");
    output.push_str("  PI_PARALLEL_DEPTH, PI_GUARD_DIGITS (also read from .env)\n");
    output
}
