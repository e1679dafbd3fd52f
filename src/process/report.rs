use serde::Serialize;

#[derive(Serialize, Debug)]
pub struct RunReport<FrameT: Serialize> {
    pub steps: usize,
    pub frames: Vec<FrameT>,
}
