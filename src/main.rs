use tinylisp::Session;

fn main() {
    let session = Session::new();

    let program = [
        "(define pi 3.141592653)",
        "(define area (lambda (r) (* pi (* r r))))",
        "(area 3)",
        "(display area-of-r3: (area 3))",
    ];

    for input in program {
        println!("> {}", input);
        match session.eval(input) {
            Ok(result) => println!("{}", result),
            Err(e) => e.pretty_print(input),
        }
    }
}
