//! Exception name table.

/// Source exception names and the Python exception each one raises as.
const EXCEPTIONS: &[(&str, &str)] = &[
    ("Throwable", "Exception"),
    ("Exception", "Exception"),
    ("Error", "Exception"),
    ("RuntimeException", "RuntimeError"),
    ("IllegalArgumentException", "ValueError"),
    ("IllegalStateException", "RuntimeError"),
    ("UnsupportedOperationException", "NotImplementedError"),
    ("NullPointerException", "TypeError"),
    ("ClassCastException", "TypeError"),
    ("NoSuchElementException", "LookupError"),
    ("NoSuchMethodException", "AttributeError"),
    ("NoSuchFieldException", "AttributeError"),
    ("IndexOutOfBoundsException", "IndexError"),
    ("ArrayIndexOutOfBoundsException", "IndexError"),
    ("StringIndexOutOfBoundsException", "IndexError"),
    ("IOException", "OSError"),
    ("UncheckedIOException", "OSError"),
    ("FileNotFoundException", "FileNotFoundError"),
    ("EOFException", "EOFError"),
    ("SocketException", "OSError"),
    ("UnknownHostException", "OSError"),
    ("SSLException", "OSError"),
    ("ZipException", "OSError"),
    ("BindException", "PermissionError"),
    ("ClassNotFoundException", "ImportError"),
    ("NoClassDefFoundError", "ImportError"),
    ("NumberFormatException", "ValueError"),
    ("ParseException", "ValueError"),
    ("DateTimeParseException", "ValueError"),
    ("PatternSyntaxException", "ValueError"),
    ("MalformedURLException", "ValueError"),
    ("URISyntaxException", "ValueError"),
    ("DataFormatException", "ValueError"),
    ("SQLException", "RuntimeError"),
    ("TimeoutException", "TimeoutError"),
    ("InterruptedException", "KeyboardInterrupt"),
    ("ConcurrentModificationException", "RuntimeError"),
    ("ArithmeticException", "ArithmeticError"),
    ("SecurityException", "PermissionError"),
    ("AccessControlException", "PermissionError"),
    ("AssertionError", "AssertionError"),
    ("OutOfMemoryError", "MemoryError"),
    ("StackOverflowError", "RecursionError"),
];

/// Map a (possibly package-qualified) exception name to its Python counterpart.
///
/// Unknown names pass through unqualified, so user-defined exception classes
/// keep their own names. Every output maps to itself.
pub fn map_exception_name(name: &str) -> &str {
    let name = name.trim();
    let simple = name.rsplit('.').next().unwrap_or(name);
    EXCEPTIONS
        .iter()
        .find(|(from, _)| *from == simple)
        .map(|(_, to)| *to)
        .unwrap_or(simple)
}
