use std::error::Error;
use std::process::ExitCode;

use softrender::prelude::*;

const WIDTH: i32 = 800;
const HEIGHT: i32 = 800;

const EYE: Vec3 = Vec3::new(-1.0, 0.0, 2.0);
const CENTER: Vec3 = Vec3::ZERO;
const LIGHT_DIR: Vec3 = Vec3::new(1.0, 1.0, 1.0);

fn render(paths: &[String]) -> Result<(), Box<dyn Error>> {
    let transforms = Transforms::new(
        EYE,
        CENTER,
        Vec3::UP,
        WIDTH / 16,
        HEIGHT / 16,
        WIDTH * 7 / 8,
        HEIGHT * 7 / 8,
    );
    let mut framebuffer = TgaImage::new(WIDTH, HEIGHT, Format::Rgb);
    let mut zbuffer = DepthBuffer::new(WIDTH, HEIGHT);

    for path in paths {
        let mesh = Mesh::from_obj(path)?;
        eprintln!("{path}: {} vertices, {} faces", mesh.nverts(), mesh.nfaces());

        let mut shader = PhongShader::new(&mesh, &transforms, LIGHT_DIR);
        for face in 0..mesh.nfaces() {
            let clip = [
                shader.vertex(face, 0),
                shader.vertex(face, 1),
                shader.vertex(face, 2),
            ];
            rasterize(&clip, &shader, &transforms, &mut zbuffer, &mut framebuffer);
        }
    }

    framebuffer.write_file("framebuffer.tga", true)?;
    Ok(())
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!("usage: {} model.obj [model.obj ...]", args[0]);
        return ExitCode::FAILURE;
    }

    match render(&args[1..]) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
