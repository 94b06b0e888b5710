mod discovery;
mod road_net;
mod sim_time;
mod solver;
mod traci_codec;
