use anyhow::Context;

#[cfg(target_arch = "wasm32")]
fn format_url(file_name: &str) -> anyhow::Result<reqwest::Url> {
    let origin = web_sys::window()
        .context("no window")?
        .location()
        .origin()
        .map_err(|_| anyhow::anyhow!("page origin is not readable"))?;
    let base = reqwest::Url::parse(&format!("{}/assets/", origin))?;
    Ok(base.join(file_name)?)
}

/// Reads a file below the assets root: `./assets` natively, `<origin>/assets` on the web.
pub async fn load_binary(file_name: &str) -> anyhow::Result<Vec<u8>> {
    #[cfg(target_arch = "wasm32")]
    let data = {
        let url = format_url(file_name)?;
        let response = reqwest::get(url).await?.error_for_status()?;
        response.bytes().await?.to_vec()
    };
    #[cfg(not(target_arch = "wasm32"))]
    let data = {
        let path = std::path::Path::new("./").join("assets").join(file_name);
        tokio::fs::read(&path)
            .await
            .with_context(|| format!("cannot read {}", path.display()))?
    };

    Ok(data)
}

/// Resolves `uri` relative to the directory of the file that referenced it.
pub fn sibling_path(referrer: &str, uri: &str) -> String {
    match referrer.rfind('/') {
        Some(idx) => format!("{}/{}", &referrer[..idx], uri),
        None => uri.to_string(),
    }
}

/// Decodes an encoded image (png, jpeg, ...) into RGBA8.
pub fn decode_image(bytes: &[u8], mime_type: Option<&str>) -> anyhow::Result<image::RgbaImage> {
    let format = mime_type
        .and_then(|mime| mime.split('/').last())
        .and_then(image::ImageFormat::from_extension);
    let image = match format {
        Some(format) => image::load_from_memory_with_format(bytes, format)?,
        None => image::load_from_memory(bytes)?,
    };
    Ok(image.to_rgba8())
}
