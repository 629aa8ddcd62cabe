//! End-to-end transpile tests over whole programs.

use kiln_transpile::output::PRELUDE;
use kiln_transpile::{TranspileError, TranspileOptions, transpile, transpile_with};

fn without_markers(src: &str) -> String {
    let options = TranspileOptions {
        markers: false,
        ..TranspileOptions::default()
    };
    transpile_with(src, &options).unwrap()
}

/// Generated text after the runtime prelude.
fn program(py: &str) -> &str {
    py.strip_prefix(PRELUDE.trim_end())
        .expect("output starts with the prelude")
        .trim_start()
}

const SHAPES: &str = r#"
class Shape {
    double area() { return 0; }
    public String toString() { return "Shape(" + area() + ")"; }
}

class Square extends Shape {
    int side;

    Square(int side) {
        this.side = side;
    }

    double area() { return side * side; }
}

class Main {
    public static void main(String[] args) {
        Shape s = new Square(3);
        System.out.println(s);
    }
}
"#;

#[test]
fn inheritance_program() {
    let py = without_markers(SHAPES);
    insta::assert_snapshot!(program(&py), @r#"
    class Shape:
        def __init__(self):
            pass

        def area(self):
            return 0

        def toString(self):
            return _kiln_plus("Shape(", self.area(), ")")

        def __str__(self):
            return self.toString()


    class Square(Shape):
        def __init__(self, side):
            super().__init__()
            self.side = 0
            self.side = side

        def area(self):
            return self.side * self.side


    class Main:
        def __init__(self):
            pass

        @staticmethod
        def main(args):
            s = Square(3)
            print(_kiln_str(s))


    def main(*args):
        return Main.main(*args)


    if __name__ == '__main__':
        Main.main(sys.argv[1:])
    "#);
}

#[test]
fn markers_carry_file_and_line() {
    let src = "FILE-MARK: demo/Main.java\nclass Main {\n    public static void main(String[] args) {\n        int x = 1;\n\n        System.out.println(x);\n    }\n}\n";
    let py = transpile(src).unwrap();
    let marker_lines: Vec<&str> = py
        .lines()
        .map(str::trim)
        .filter(|l| l.starts_with("# kiln-src: "))
        .collect();
    assert_eq!(
        marker_lines,
        [
            "# kiln-src: demo/Main.java:2",
            "# kiln-src: demo/Main.java:3",
            "# kiln-src: demo/Main.java:5",
            "# kiln-src: -",
        ]
    );
}

#[test]
fn subclasses_are_emitted_after_their_base() {
    let src = "class Dog extends Animal { }\nclass Animal { }\nclass Main { static void main(String[] a) { } }\n";
    let py = without_markers(src);
    let animal = py.find("class Animal:").unwrap();
    let dog = py.find("class Dog(Animal):").unwrap();
    assert!(animal < dog);
}

#[test]
fn exception_bases_are_mapped() {
    let src = "class Oops extends IllegalStateException {\n  Oops(String m) { super(m); }\n}\nclass Main { static void main(String[] a) { throw new Oops(\"x\"); } }\n";
    let py = without_markers(src);
    assert!(py.contains("class Oops(RuntimeError):"));
    assert!(py.contains("        super().__init__(m)\n"));
    assert!(!py.contains("super().__init__()\n"));
    assert!(py.contains("raise Oops(\"x\")"));
}

#[test]
fn overloads_get_dispatchers() {
    let src = r#"
class Foo {
    Foo(int n) { }
    Foo(String s, int[] xs) { }
}
class Main {
    static int twice(int x) { return x * 2; }
    static String twice(String s) { return s + s; }
    public static void main(String[] args) { }
}
"#;
    let py = without_markers(src);
    assert!(py.contains("    def _init__ov0(self, n):\n"));
    assert!(py.contains("    def _init__ov1(self, s, xs):\n"));
    assert!(py.contains(
        "        if len(args) == 2 and _kiln_accepts(args[0], 'String', False) and _kiln_accepts(args[1], 'int', True):\n            return Foo._init__ov1(self, *args)\n"
    ));
    assert!(py.contains("        raise TypeError('no matching overload for Foo.<init>')\n"));
    assert!(py.contains("    @staticmethod\n    def twice(*args):\n"));
    assert!(py.contains("            return Main.twice__ov0(*args)\n"));
}

#[test]
fn inherited_overloads_dispatch_through_their_declaring_class() {
    let src = r#"
class A {
    void f(int x) { }
    void f(String s) { }
}
class B extends A {
    void f(String s) { }
    void f(boolean b) { }
}
class Main {
    public static void main(String[] args) { }
}
"#;
    let py = without_markers(src);
    assert!(py.contains("            return A.f__ov0(self, *args)\n"));
    assert!(py.contains(
        "        if len(args) == 1 and _kiln_accepts(args[0], 'String', False):\n            return B.f__ov0(self, *args)\n"
    ));
    assert!(py.contains("            return B.f__ov1(self, *args)\n"));
    assert!(py.contains("        raise TypeError('no matching overload for B.f')\n"));
}

#[test]
fn static_fields_are_initialized_after_classes() {
    let src = "class Main {\n  static int count = 2;\n  static int next() { count++; return count; }\n  public static void main(String[] a) { }\n}\n";
    let py = without_markers(src);
    assert!(py.contains("\nMain.count = 2\n"));
    assert!(py.contains("        Main.count += 1\n"));
    assert!(py.find("Main.count = 2").unwrap() < py.find("if __name__").unwrap());
}

#[test]
fn entry_class_option() {
    let src = "class A { static void main(String[] a) { } }\nclass B { static void main() { } }\n";
    let options = TranspileOptions {
        entry_class: Some("B".to_string()),
        markers: false,
    };
    let py = transpile_with(src, &options).unwrap();
    assert!(py.ends_with("if __name__ == '__main__':\n    B.main()\n"));

    let err = transpile_with(
        src,
        &TranspileOptions {
            entry_class: Some("C".to_string()),
            ..options
        },
    )
    .unwrap_err();
    assert!(matches!(err, TranspileError::EntryNotFound(ref name) if name == "C"));
}

#[test]
fn structural_errors() {
    assert!(matches!(
        transpile("// nothing here\n").unwrap_err(),
        TranspileError::NoClasses
    ));
    assert!(matches!(
        transpile("class A { void run() { } }").unwrap_err(),
        TranspileError::NoMain
    ));
    let err = transpile("FILE-MARK: Broken.java\n\nclass Broken {\n  void f() {\n").unwrap_err();
    assert_eq!(
        err.to_string(),
        "Broken.java:2: class `Broken` has no matching closing brace"
    );
}
