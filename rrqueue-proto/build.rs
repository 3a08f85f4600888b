use actix_prost_build::{ActixGenerator, GeneratorList};
use prost_build::{Config, ServiceGenerator};
use std::{env, path::Path};

fn compile(
    protos: &[impl AsRef<Path>],
    includes: &[impl AsRef<Path>],
    generator: Box<dyn ServiceGenerator>,
) -> Result<(), Box<dyn std::error::Error>> {
    let out = env::var("OUT_DIR").expect("OUT_DIR environment variable not set");
    let swagger_dir = "swagger/v1";
    let swagger_filename = "rrqueue";

    Config::new()
        .service_generator(generator)
        .file_descriptor_set_path(Path::new(&out).join("file_descriptor_set.bin"))
        .protoc_arg(format!("--openapiv2_out={swagger_dir}"))
        .protoc_arg("--openapiv2_opt")
        .protoc_arg(format!("grpc_api_configuration=proto/v1/api_config_http.yaml,output_format=yaml,allow_merge=true,merge_file_name={swagger_filename},json_names_for_fields=false"))
        .bytes(["."])
        .btree_map(["."])
        .type_attribute(".", "#[actix_prost_macros::serde(rename_all=\"snake_case\")]")
        .retain_enum_prefix()
        .compile_protos(protos, includes)?;

    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=proto/");

    std::fs::create_dir_all("./swagger/v1").unwrap();

    let gens = Box::new(GeneratorList::new(vec![
        tonic_build::configure().service_generator(),
        Box::new(ActixGenerator::new("proto/v1/api_config_http.yaml").unwrap()),
    ]));

    compile(
        &["proto/v1/rrqueue.proto", "proto/v1/health.proto"],
        &["proto"],
        gens,
    )?;

    Ok(())
}
