pub mod ffmpeg_chunk_decoder;
pub mod ffmpeg_reader;
pub mod ffmpeg_transcoder;
pub mod ffmpeg_writer;
pub mod image_codec;

#[cfg(test)]
pub(crate) mod test_video;
