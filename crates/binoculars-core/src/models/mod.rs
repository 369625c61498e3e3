//! Binoculars 도메인 모델.
//!
//! 에이전트-콜렉터 간 공유하는 데이터 구조체와
//! 저장소 어댑터가 사용하는 포인트 타입을 정의한다.

pub mod metric;
pub mod point;
pub mod response;
