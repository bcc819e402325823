//! Production decode + GL upload: `image` crate → RGBA8 → GL texture.
//!
//! Everything here runs on the main thread with the GL context current.

use image::GenericImageView;

use crate::cache::{DecodedImage, Decoder, FilterMode, LoadError, TextureBackend};

/// Decodes image files from disk.
pub struct FileDecoder;

impl Decoder for FileDecoder {
    fn decode(&self, path: &str) -> Result<DecodedImage, LoadError> {
        let img = image::open(path).map_err(|e| LoadError::DecodeFailed {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        let (width, height) = img.dimensions();
        Ok(DecodedImage {
            rgba: img.into_rgba8().into_raw(),
            width,
            height,
        })
    }
}

/// GL texture backend. Handles are raw GL texture ids; the cache owns them
/// and releases every one it created.
pub struct GlTextures;

impl TextureBackend for GlTextures {
    type Handle = u32;

    fn upload(
        &mut self,
        path: &str,
        img: &DecodedImage,
        filter: FilterMode,
    ) -> Result<u32, LoadError> {
        let tex = unsafe {
            let mut tex = 0u32;
            gl::GenTextures(1, &mut tex);
            gl::BindTexture(gl::TEXTURE_2D, tex);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_S, gl::CLAMP_TO_EDGE as i32);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_T, gl::CLAMP_TO_EDGE as i32);
            gl::TexImage2D(
                gl::TEXTURE_2D,
                0,
                gl::RGBA8 as i32,
                img.width as i32,
                img.height as i32,
                0,
                gl::RGBA,
                gl::UNSIGNED_BYTE,
                img.rgba.as_ptr() as *const _,
            );
            match filter {
                FilterMode::Nearest => {
                    gl::TexParameteri(
                        gl::TEXTURE_2D,
                        gl::TEXTURE_MIN_FILTER,
                        gl::NEAREST as i32,
                    );
                    gl::TexParameteri(
                        gl::TEXTURE_2D,
                        gl::TEXTURE_MAG_FILTER,
                        gl::NEAREST as i32,
                    );
                }
                FilterMode::LinearMipmap => {
                    gl::GenerateMipmap(gl::TEXTURE_2D);
                    gl::TexParameteri(
                        gl::TEXTURE_2D,
                        gl::TEXTURE_MIN_FILTER,
                        gl::LINEAR_MIPMAP_LINEAR as i32,
                    );
                    gl::TexParameteri(
                        gl::TEXTURE_2D,
                        gl::TEXTURE_MAG_FILTER,
                        gl::LINEAR as i32,
                    );
                }
            }
            gl::BindTexture(gl::TEXTURE_2D, 0);
            tex
        };

        // Huge images can exhaust VRAM; GL reports it via the error flag.
        let err = unsafe { gl::GetError() };
        if err == gl::OUT_OF_MEMORY {
            unsafe {
                gl::DeleteTextures(1, &tex);
            }
            return Err(LoadError::AllocationFailed {
                path: path.to_string(),
            });
        }

        Ok(tex)
    }

    fn release(&mut self, handle: u32) {
        unsafe {
            gl::DeleteTextures(1, &handle);
        }
    }
}
